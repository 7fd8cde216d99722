pub mod nmds;
pub mod solve;
