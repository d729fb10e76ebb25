mod ddpg;
mod train;

pub use ddpg::DDPG_Config;
pub use train::TrainConfig;
