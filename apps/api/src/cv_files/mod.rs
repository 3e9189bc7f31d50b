// Pass-through of the external CV-file endpoints.

pub mod handlers;
