//! Candle implementations of the actor and the critic.
//!
//! Both are two-hidden-layer ReLU perceptrons. The live and the target copy
//! of a network share one [`VarMap`], with their variables told apart by the
//! name prefix (`actor-fc0.weight` vs `target-actor-fc0.weight`), so a single
//! safetensors file holds everything needed to restore a network.

use {
    super::{
        ActorFunction,
        CriticFunction,
        SaveableNetwork,
    },
    crate::configs::DDPG_Config,
    candle_core::{
        DType,
        Device,
        Error,
        Module,
        Result,
        Tensor,
        Var,
    },
    candle_nn::{
        linear,
        sequential::seq,
        Activation,
        AdamW,
        Optimizer,
        ParamsAdamW,
        Sequential,
        VarBuilder,
        VarMap,
    },
    std::path::Path,
};

fn track(
    varmap: &mut VarMap,
    vb: &VarBuilder,
    target_prefix: &str,
    network_prefix: &str,
    dims: &[(usize, usize)],
    tau: f64,
) -> Result<()> {
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        let target_w = vb.get((out_dim, in_dim), &format!("{target_prefix}-fc{i}.weight"))?;
        let network_w = vb.get((out_dim, in_dim), &format!("{network_prefix}-fc{i}.weight"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.weight"),
            ((tau * network_w)? + ((1.0 - tau) * target_w)?)?,
        )?;

        let target_b = vb.get(out_dim, &format!("{target_prefix}-fc{i}.bias"))?;
        let network_b = vb.get(out_dim, &format!("{network_prefix}-fc{i}.bias"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.bias"),
            ((tau * network_b)? + ((1.0 - tau) * target_b)?)?,
        )?;
    }
    Ok(())
}

fn mlp(
    vb: &VarBuilder,
    prefix: &str,
    dims: &[(usize, usize)],
    output: Option<Activation>,
) -> Result<Sequential> {
    let mut network = seq();
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        network = network.add(linear(in_dim, out_dim, vb.pp(format!("{prefix}-fc{i}")))?);
        if i + 1 < dims.len() {
            network = network.add(Activation::Relu);
        }
    }
    if let Some(activation) = output {
        network = network.add(activation);
    }
    Ok(network)
}

fn filter_by_prefix(
    varmap: &VarMap,
    prefix: &str,
) -> Vec<Var> {
    varmap
        .data()
        .lock()
        .unwrap()
        .iter()
        .filter_map(|(name, var)| name.starts_with(prefix).then_some(var.clone()))
        .collect()
}

/// Policy network with a sigmoid output layer, so raw actions live in `(0, 1)`.
pub struct Actor {
    varmap: VarMap,
    vb: VarBuilder<'static>,
    network: Sequential,
    target_network: Sequential,
    dims: Vec<(usize, usize)>,
    optim: AdamW,
    tau: f64,
}

impl Actor {
    pub fn new(
        device: &Device,
        dims: &[(usize, usize)],
        learning_rate: f64,
        tau: f64,
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);

        let network = mlp(&vb, "actor", dims, Some(Activation::Sigmoid))?;
        let target_network = mlp(&vb, "target-actor", dims, Some(Activation::Sigmoid))?;

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut varmap, &vb, "target-actor", "actor", dims, 1.0)?;

        let optim = AdamW::new(
            filter_by_prefix(&varmap, "actor-"),
            ParamsAdamW {
                lr: learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            dims: dims.to_vec(),
            optim,
            tau,
        })
    }

    pub fn from_config(
        device: &Device,
        config: &DDPG_Config,
        size_state: usize,
        size_action: usize,
    ) -> Result<Self> {
        Self::new(
            device,
            &[
                (size_state, config.hidden_1_size),
                (config.hidden_1_size, config.hidden_2_size),
                (config.hidden_2_size, size_action),
            ],
            config.actor_learning_rate,
            config.tau,
        )
    }

    pub fn forward(
        &self,
        states: &Tensor,
    ) -> Result<Tensor> {
        self.network.forward(states)
    }

    pub fn target_forward(
        &self,
        states: &Tensor,
    ) -> Result<Tensor> {
        self.target_network.forward(states)
    }
}

impl ActorFunction for Actor {
    fn action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        // Candle assumes a batch dimension, so when we don't have one we need
        // to pretend we do by un- and resqueezing the state tensor.
        self.forward(&state.detach().unsqueeze(0)?)?.squeeze(0)
    }

    fn actions(
        &self,
        states: &Tensor,
    ) -> Result<Tensor> {
        self.forward(states)
    }

    fn target_actions(
        &self,
        next_states: &Tensor,
    ) -> Result<Tensor> {
        self.target_forward(next_states)
    }

    fn train(
        &mut self,
        action_gradients: &Tensor,
        states: &Tensor,
    ) -> Result<()> {
        // d(loss)/d(action) == -action_gradients / n, so a descent step on the
        // loss moves every action along its supplied gradient.
        let n = states.dim(0)? as f64;
        let actions = self.network.forward(&states.detach())?;
        let loss = ((actions * action_gradients.detach())?.sum_all()?.neg()? / n)?;
        self.optim.backward_step(&loss)
    }

    fn update_target(&mut self) -> Result<()> {
        track(
            &mut self.varmap,
            &self.vb,
            "target-actor",
            "actor",
            &self.dims,
            self.tau,
        )
    }
}

impl SaveableNetwork for Actor {
    fn save(
        &self,
        path: &Path,
    ) -> anyhow::Result<()> {
        Ok(self.varmap.save(path)?)
    }

    fn load(
        &mut self,
        path: &Path,
    ) -> anyhow::Result<()> {
        Ok(self.varmap.load(path)?)
    }
}

/// Action-value network, taking the concatenation `[action, state]`.
pub struct Critic {
    varmap: VarMap,
    vb: VarBuilder<'static>,
    network: Sequential,
    target_network: Sequential,
    dims: Vec<(usize, usize)>,
    optim: AdamW,
    tau: f64,
}

impl Critic {
    pub fn new(
        device: &Device,
        dims: &[(usize, usize)],
        learning_rate: f64,
        weight_decay: f64,
        tau: f64,
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, device);

        let network = mlp(&vb, "critic", dims, None)?;
        let target_network = mlp(&vb, "target-critic", dims, None)?;

        // this sets the two networks to be equal to each other using tau = 1.0
        track(&mut varmap, &vb, "target-critic", "critic", dims, 1.0)?;

        let optim = AdamW::new(
            filter_by_prefix(&varmap, "critic-"),
            ParamsAdamW {
                lr: learning_rate,
                weight_decay,
                ..Default::default()
            },
        )?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            dims: dims.to_vec(),
            optim,
            tau,
        })
    }

    pub fn from_config(
        device: &Device,
        config: &DDPG_Config,
        size_state: usize,
        size_action: usize,
    ) -> Result<Self> {
        Self::new(
            device,
            &[
                (size_state + size_action, config.hidden_1_size),
                (config.hidden_1_size, config.hidden_2_size),
                (config.hidden_2_size, 1),
            ],
            config.critic_learning_rate,
            config.critic_weight_decay,
            config.tau,
        )
    }

    pub fn forward(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[actions, states], 1)?;
        self.network.forward(&xs)
    }

    pub fn target_forward(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[actions, states], 1)?;
        self.target_network.forward(&xs)
    }
}

impl CriticFunction for Critic {
    fn target_q(
        &self,
        next_states: &Tensor,
        next_actions: &Tensor,
    ) -> Result<Tensor> {
        Ok(self.target_forward(next_states, next_actions)?.detach())
    }

    fn train(
        &mut self,
        targets: &Tensor,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<()> {
        let q = self.forward(&states.detach(), &actions.detach())?;
        let loss = (q - targets.detach())?.sqr()?.mean_all()?;
        self.optim.backward_step(&loss)
    }

    fn gradients(
        &self,
        states: &Tensor,
        actions: &Tensor,
    ) -> Result<Tensor> {
        let actions = Var::from_tensor(&actions.detach())?;
        let q = self.forward(&states.detach(), actions.as_tensor())?;

        // Rows are independent, so the gradient of the sum is the per-sample
        // gradient.
        let grads = q.neg()?.sum_all()?.backward()?;
        grads
            .get(actions.as_tensor())
            .cloned()
            .ok_or_else(|| Error::Msg("critic produced no gradient for the actions".to_owned()))
    }

    fn update_target(&mut self) -> Result<()> {
        track(
            &mut self.varmap,
            &self.vb,
            "target-critic",
            "critic",
            &self.dims,
            self.tau,
        )
    }
}

impl SaveableNetwork for Critic {
    fn save(
        &self,
        path: &Path,
    ) -> anyhow::Result<()> {
        Ok(self.varmap.save(path)?)
    }

    fn load(
        &mut self,
        path: &Path,
    ) -> anyhow::Result<()> {
        Ok(self.varmap.load(path)?)
    }
}
