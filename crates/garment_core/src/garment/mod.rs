pub mod features;
pub mod fixed;
pub mod learned;
pub mod pipeline;
