pub mod evaluate;
pub mod solve;
