pub mod health;
pub mod trajectories;
