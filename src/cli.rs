use {
    crate::{
        agents::{
            networks::{
                Actor,
                Critic,
            },
            DDPG,
        },
        configs::{
            DDPG_Config,
            TrainConfig,
        },
        engines::run_experiment_off_policy,
        envs::{
            ReachConfig,
            ReachEnv,
        },
        logging::setup_logging,
        util::read_config,
    },
    anyhow::Result,
    candle_core::Device,
    clap::{
        Parser,
        ValueEnum,
    },
    std::{
        fs::create_dir_all,
        path::Path,
    },
    tracing::{
        warn,
        Level,
    },
};


#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // phase changes and checkpoints
    Debug, // every training step
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::Debug => Some(Level::DEBUG),
            Loglevel::None => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum ArgDevice {
    Cpu,
    Cuda,
}
impl ArgDevice {
    /// Falls back to the CPU when no CUDA device is available.
    pub fn device(&self) -> Result<Device> {
        Ok(match self {
            ArgDevice::Cpu => Device::Cpu,
            ArgDevice::Cuda => Device::cuda_if_available(0)?,
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The device to train on.
    #[arg(long, value_enum, default_value_t=ArgDevice::Cpu)]
    pub device: ArgDevice,

    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::Warn)]
    pub log: Loglevel,

    /// Ron file with the agent config, the reach preset otherwise.
    #[arg(long)]
    pub alg_config: Option<String>,

    /// Ron file with the training config, the reach preset otherwise.
    #[arg(long)]
    pub train_config: Option<String>,

    /// Ron file with the environment config, the default otherwise.
    #[arg(long)]
    pub env_config: Option<String>,

    /// Overrides the number of training episodes.
    #[arg(long)]
    pub episodes: Option<usize>,

    /// Overrides the checkpoint frequency, 0 disables checkpoints.
    #[arg(long)]
    pub checkpoint_frequency: Option<usize>,

    /// The number of repeated, identical runs.
    #[arg(long, default_value_t = 1)]
    pub repetitions: usize,

    /// Name of the experiment, results go to `data/<output>`.
    #[arg(long, default_value = "reach")]
    pub output: String,

    /// Directory and name of a checkpoint to start from.
    #[arg(long, num_args = 2, value_names = ["DIR", "NAME"])]
    pub load_model: Option<Vec<String>>,
}

/// Set up logging, assemble the configs from files, presets and overrides,
/// and run the reach experiment with the candle DDPG agent.
pub fn run(args: Args) -> Result<()> {
    let path = Path::new("data/").join(&args.output);
    create_dir_all(&path)?;

    if let Some(level) = args.log.level() {
        setup_logging(
            &path.join("debug.log"),
            Some(level),
            Some(level),
        )?;
    }

    let env_config: ReachConfig = match &args.env_config {
        Some(file) => read_config(file)?,
        None => ReachConfig::default(),
    };
    let alg_config = match &args.alg_config {
        Some(file) => read_config(file)?,
        None => DDPG_Config::reach(env_config.size_action),
    };
    let mut train_config = match &args.train_config {
        Some(file) => read_config(file)?,
        None => TrainConfig::reach(),
    };
    if let Some(episodes) = args.episodes {
        train_config.set_max_episodes(episodes);
    }
    if let Some(freq) = args.checkpoint_frequency {
        train_config.set_checkpoint_frequency((freq > 0).then_some(freq));
    }

    let device = args.device.device()?;
    warn!("running {} on {device:?}", args.output);

    run_experiment_off_policy::<DDPG<Actor, Critic>, ReachEnv, _, _, _>(
        &path,
        args.repetitions,
        env_config,
        alg_config,
        train_config,
        DDPG::from_config,
        args.load_model.map(|v| (v[0].clone(), v[1].clone())),
        &device,
    )
}
