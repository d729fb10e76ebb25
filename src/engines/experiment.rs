use {
    super::run::{
        loop_off_policy,
        Checkpointing,
    },
    crate::{
        agents::{
            Algorithm,
            OffPolicyAlgorithm,
            RunMode,
            SaveableAlgorithm,
        },
        configs::TrainConfig,
        envs::{
            Environment,
            TensorConvertible,
        },
        util::write_config,
    },
    anyhow::{
        anyhow,
        Result,
    },
    candle_core::Device,
    polars::prelude::{
        DataFrame,
        NamedFrom,
        ParquetWriter,
        Series,
    },
    serde::Serialize,
    std::{
        fs::{
            create_dir_all,
            File,
        },
        path::Path,
    },
    tracing::warn,
};

/// Write the per-episode results of one phase of one run as parquet.
fn write_results(
    path: &Path,
    n: usize,
    phase: &str,
    mc_returns: &[f64],
    successes: &[bool],
) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Series::new(
            &format!("run_{n}_{phase}_total_rewards"),
            mc_returns,
        ),
        Series::new(
            &format!("run_{n}_{phase}_successes"),
            successes,
        ),
    ])?;

    ParquetWriter::new(
        File::create(path.join(format!("run_{n}_{phase}.parquet")))?
    ).finish(&mut df)?;
    Ok(())
}

/// Run an experiment with an off-policy algorithm.
///
/// Every repetition builds a fresh environment and agent, trains, saves the
/// final weights as `run_{n}` and then evaluates greedily. The configs are
/// written to `path` as ron before the first run, the results of each run as
/// `run_{n}_train.parquet` and `run_{n}_test.parquet`.
///
/// # Arguments
///
/// * `path` - The directory where the collected data will be stored.
/// * `n_repetitions` - The number of repeated, identical runs to perform.
/// * `env_config` - The configuration for the environment.
/// * `alg_config` - The configuration for the algorithm.
/// * `train_config` - The configuration for training and evaluation.
/// * `init_alg` - Builds an agent from the config and the state and action sizes.
/// * `load_model` - Directory and name of a checkpoint to start from.
/// * `device` - The device to run the experiment on.
#[allow(clippy::too_many_arguments)]
pub fn run_experiment_off_policy<Alg, Env, Obs, Act, F>(
    path: &dyn AsRef<Path>,
    n_repetitions: usize,
    env_config: Env::Config,
    alg_config: Alg::Config,
    train_config: TrainConfig,
    init_alg: F,
    load_model: Option<(String, String)>,
    device: &Device,
) -> Result<()>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Env::Config: Clone + Serialize,
    Alg: Algorithm + OffPolicyAlgorithm + SaveableAlgorithm,
    Alg::Config: Serialize,
    Obs: TensorConvertible,
    Act: TensorConvertible,
    F: Fn(&Device, &Alg::Config, usize, usize) -> Result<Alg>,
{
    let path = path.as_ref();

    let alg_config_exists = path.join("config_algorithm.ron").try_exists()?;
    let env_config_exists = path.join("config_environment.ron").try_exists()?;
    if alg_config_exists || env_config_exists {
        Err(anyhow!(concat!(
            "Config files already exist in this directory!\n",
            "I am assuming I would be overwriting existing data!",
        )))?
    }

    create_dir_all(path)?;
    write_config(&alg_config, path.join("config_algorithm.ron"))?;
    write_config(&env_config, path.join("config_environment.ron"))?;
    write_config(&train_config, path.join("config_training.ron"))?;

    for n in 0..n_repetitions {
        warn!("Collecting data, run {n}/{n_repetitions}");

        // Create the Agent and the Environment

        let mut env = *Env::new(env_config.clone())?;
        let mut alg = init_alg(
            device,
            &alg_config,
            env.observation_space().iter().product::<usize>(),
            env.action_space().iter().product::<usize>(),
        )?;

        // Maybe load model weights

        if let Some((model_path, model_name)) = &load_model {
            warn!("Loading model weights from {model_path} with name {model_name}");
            alg.load(Path::new(model_path), model_name)?;
        }

        // Train, then evaluate greedily

        let run_name = format!("run_{n}");
        let (mc_returns, successes) = loop_off_policy(
            &mut env,
            &mut alg,
            &train_config,
            RunMode::Train,
            Some(Checkpointing { dir: path, name: &run_name }),
            device,
        )?;
        write_results(path, n, "train", &mc_returns, &successes)?;
        alg.save(path, &run_name)?;

        let (mc_returns, successes) = loop_off_policy(
            &mut env,
            &mut alg,
            &train_config,
            RunMode::Test,
            None,
            device,
        )?;
        warn!(
            "run {n} evaluated with avg return {} and {}/{} successes",
            mc_returns.iter().sum::<f64>() / mc_returns.len().max(1) as f64,
            successes.iter().filter(|&&s| s).count(),
            successes.len(),
        );
        write_results(path, n, "test", &mc_returns, &successes)?;
    }
    Ok(())
}
