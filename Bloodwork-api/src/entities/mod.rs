// Public entities for the bloodwork API
// Request and response shapes that exist only at the HTTP boundary.
// Domain entities are serialized directly where they already fit.

// Error responses and pagination
pub mod common;

// Query parameters and bodies for bloodwork endpoints
pub mod bloodwork;
