//! Policy/value network definitions.
//!
//! Both parameterisations take a batch of encoded boards of shape
//! `(batch, 9)` and return `(value, logits)` with shapes `(batch,)` and
//! `(batch, 18)`.

use std::fmt;
use std::str::FromStr;

use candle_core::{Tensor, D};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Dropout, Linear, Module, VarBuilder};
use games_subtraction::{BOARD_SIZE, NUM_ACTIONS, NUM_CELLS};

use crate::error::NetworkError;

/// Channels in every convolution of the conv trunk.
const CONV_CHANNELS: usize = 32;

/// Dropout applied between hidden layers while training.
const DROPOUT: f32 = 0.1;

/// Which architecture to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkKind {
    /// Two independent MLP heads over the flat board.
    #[default]
    Flat,
    /// Shared 3×3 convolution trunk feeding both heads.
    Conv,
}

impl FromStr for NetworkKind {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "mlp" => Ok(NetworkKind::Flat),
            "conv" | "cnn" => Ok(NetworkKind::Conv),
            other => Err(NetworkError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Flat => write!(f, "flat"),
            NetworkKind::Conv => write!(f, "conv"),
        }
    }
}

/// Shape of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub kind: NetworkKind,
    pub hidden_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            kind: NetworkKind::Flat,
            hidden_size: 128,
        }
    }
}

impl NetworkConfig {
    pub fn new(kind: NetworkKind, hidden_size: usize) -> Self {
        Self { kind, hidden_size }
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.hidden_size == 0 {
            return Err(NetworkError::InvalidConfig(
                "hidden_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Linear stack with ReLU and dropout between layers.
#[derive(Debug, Clone)]
struct Mlp {
    layers: Vec<Linear>,
    dropout: Dropout,
}

impl Mlp {
    fn new(sizes: &[usize], vb: VarBuilder) -> Result<Self, NetworkError> {
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| linear(pair[0], pair[1], vb.pp(format!("fc{i}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            layers,
            dropout: Dropout::new(DROPOUT),
        })
    }

    fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor, NetworkError> {
        let last = self.layers.len().saturating_sub(1);
        let mut ys = xs.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            ys = layer.forward(&ys)?;
            if i < last {
                ys = ys.relu()?;
                ys = self.dropout.forward(&ys, train)?;
            }
        }
        Ok(ys)
    }
}

#[derive(Debug, Clone)]
enum Body {
    Flat,
    Conv { conv1: Conv2d, conv2: Conv2d },
}

/// Value and policy heads on top of an optional conv trunk.
#[derive(Debug, Clone)]
pub struct PolicyValueNet {
    config: NetworkConfig,
    body: Body,
    value_head: Mlp,
    policy_head: Mlp,
}

impl PolicyValueNet {
    /// Build the network, creating or loading parameters through `vb`.
    pub fn new(config: NetworkConfig, vb: VarBuilder) -> Result<Self, NetworkError> {
        config.validate()?;
        let hidden = config.hidden_size;

        let (body, features) = match config.kind {
            NetworkKind::Flat => (Body::Flat, NUM_CELLS),
            NetworkKind::Conv => {
                let cfg = Conv2dConfig {
                    padding: 1,
                    ..Default::default()
                };
                let conv1 = conv2d(1, CONV_CHANNELS, 3, cfg, vb.pp("conv1"))?;
                let conv2 = conv2d(CONV_CHANNELS, CONV_CHANNELS, 3, cfg, vb.pp("conv2"))?;
                (Body::Conv { conv1, conv2 }, CONV_CHANNELS * NUM_CELLS)
            }
        };

        let value_head = Mlp::new(&[features, hidden, hidden, 1], vb.pp("value"))?;
        let policy_head = Mlp::new(&[features, hidden, hidden, NUM_ACTIONS], vb.pp("policy"))?;

        Ok(Self {
            config,
            body,
            value_head,
            policy_head,
        })
    }

    pub fn config(&self) -> NetworkConfig {
        self.config
    }

    /// Forward pass over `(batch, 9)` observations.
    ///
    /// Returns `(value, logits)` shaped `(batch,)` and `(batch, 18)`.
    pub fn forward(&self, xs: &Tensor, train: bool) -> Result<(Tensor, Tensor), NetworkError> {
        let features = match &self.body {
            Body::Flat => xs.clone(),
            Body::Conv { conv1, conv2 } => {
                let batch = xs.dim(0)?;
                let ys = xs.reshape((batch, 1, BOARD_SIZE, BOARD_SIZE))?;
                let ys = conv1.forward(&ys)?.relu()?;
                let ys = conv2.forward(&ys)?.relu()?;
                ys.flatten_from(1)?
            }
        };

        let value = self
            .value_head
            .forward(&features, train)?
            .squeeze(D::Minus1)?;
        let logits = self.policy_head.forward(&features, train)?;
        Ok((value, logits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("flat".parse::<NetworkKind>().unwrap(), NetworkKind::Flat);
        assert_eq!(" Conv ".parse::<NetworkKind>().unwrap(), NetworkKind::Conv);
        assert!(matches!(
            "resnet".parse::<NetworkKind>(),
            Err(NetworkError::UnknownKind(_))
        ));
        assert_eq!(NetworkKind::Conv.to_string(), "conv");
    }

    #[test]
    fn test_zero_hidden_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let result = PolicyValueNet::new(NetworkConfig::new(NetworkKind::Flat, 0), vb);
        assert!(matches!(result, Err(NetworkError::InvalidConfig(_))));
    }

    #[test]
    fn test_output_shapes() {
        for kind in [NetworkKind::Flat, NetworkKind::Conv] {
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
            let net = PolicyValueNet::new(NetworkConfig::new(kind, 16), vb).unwrap();

            let xs = Tensor::zeros((4, NUM_CELLS), DType::F32, &Device::Cpu).unwrap();
            let (value, logits) = net.forward(&xs, false).unwrap();
            assert_eq!(value.dims(), &[4], "{kind}");
            assert_eq!(logits.dims(), &[4, NUM_ACTIONS], "{kind}");
        }
    }
}
