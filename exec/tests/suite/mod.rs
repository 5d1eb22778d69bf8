// Aggregates all former standalone integration tests as modules.
mod echo;
mod execute;
mod stdin;
