mod common;
mod concurrency;
mod follower;
mod lifecycle;
mod properties;
mod scenarios;
