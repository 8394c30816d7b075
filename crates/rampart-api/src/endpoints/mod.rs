// Firewall API endpoint bindings
//
// Typed wrappers over the client core, one module per resource. Each builds
// its request body or query string and names the response shape it expects;
// none of them retry.

pub mod auth;
pub mod logs;
pub mod modes;
pub mod rules;
pub mod whitelist;
