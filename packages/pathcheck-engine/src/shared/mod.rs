/*
 * Shared Types
 *
 * Cross-feature data models.
 */

pub mod models;
