// ============================================================
// Layer 5 — Residual Network for CIFAR-10
// ============================================================
// The "6n+2" residual network from §4.2 of He et al. (2016):
//
//   stem   3×3 conv 3→16, ReLU                     32×32
//   stage1 n blocks @16                             32×32
//   stage2 1 block 16→32 (stride 2) + n-1 @32      16×16
//   stage3 1 block 32→64 (stride 2) + n-1 @64       8×8
//   head   global average pool → 64 → linear → 10
//
// Shortcuts are identity except on the first block of stages
// 2 and 3, where the input is projected with a learned 1×1
// stride-2 convolution ("option B" in the paper) instead of
// the paper's zero-padded identity.

use burn::{
    module::Param,
    optim::GradientsParams,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

use crate::domain::errors::ConfigError;
use crate::domain::image::{IMAGE_CHANNELS, NUM_CLASSES};

pub const STEM_WIDTH: usize = 16;
pub const STAGE_WIDTHS: [usize; 3] = [16, 32, 64];

fn conv3x3<B: Backend>(c_in: usize, c_out: usize, stride: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([c_in, c_out], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

// ─── Residual block ──────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ResidualBlockConfig {
    /// Output channels of the block
    pub width: usize,
    #[config(default = "false")]
    pub downsample: bool,
}

impl ResidualBlockConfig {
    /// Input channel count implied by the configuration.
    pub fn in_channels(&self) -> usize {
        if self.downsample { self.width / 2 } else { self.width }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ResidualBlock<B>, ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.downsample && self.width % 2 != 0 {
            return Err(ConfigError::OddDownsampleWidth(self.width));
        }

        let stride = if self.downsample { 2 } else { 1 };
        let conv1  = conv3x3(self.in_channels(), self.width, stride, device);
        let conv2  = conv3x3(self.width, self.width, 1, device);
        let projection = self.downsample.then(|| {
            Conv2dConfig::new([self.in_channels(), self.width], [1, 1])
                .with_stride([2, 2])
                .init(device)
        });

        Ok(ResidualBlock { conv1, conv2, projection })
    }
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub conv2:      Conv2d<B>,
    /// Present only on downsampling blocks
    pub projection: Option<Conv2d<B>>,
}

impl<B: Backend> ResidualBlock<B> {
    /// x: [batch, c_in, h, w] → [batch, width, h', w']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = relu(self.conv1.forward(x.clone()));
        let out = self.conv2.forward(out);

        let shortcut = match &self.projection {
            Some(projection) => projection.forward(x),
            None => x,
        };

        relu(out + shortcut)
    }

    pub fn downsamples(&self) -> bool {
        self.projection.is_some()
    }
}

// ─── Full network ────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Blocks per stage
    pub n: usize,
    #[config(default = "NUM_CLASSES")]
    pub num_classes: usize,
}

impl ResNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ResNet<B>, ConfigError> {
        if self.n < 1 {
            return Err(ConfigError::DepthTooSmall(self.n));
        }

        let stem   = conv3x3(IMAGE_CHANNELS, STEM_WIDTH, 1, device);
        let stage1 = self.build_stage(STAGE_WIDTHS[0], false, device)?;
        let stage2 = self.build_stage(STAGE_WIDTHS[1], true, device)?;
        let stage3 = self.build_stage(STAGE_WIDTHS[2], true, device)?;
        let pool   = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head   = LinearConfig::new(STAGE_WIDTHS[2], self.num_classes).init(device);

        Ok(ResNet { stem, stage1, stage2, stage3, pool, head })
    }

    /// First block may downsample; the remaining n-1 keep the shape.
    fn build_stage<B: Backend>(
        &self,
        width:      usize,
        downsample: bool,
        device:     &B::Device,
    ) -> Result<Vec<ResidualBlock<B>>, ConfigError> {
        (0..self.n)
            .map(|i| {
                ResidualBlockConfig::new(width)
                    .with_downsample(downsample && i == 0)
                    .init(device)
            })
            .collect()
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub stem:   Conv2d<B>,
    pub stage1: Vec<ResidualBlock<B>>,
    pub stage2: Vec<ResidualBlock<B>>,
    pub stage3: Vec<ResidualBlock<B>>,
    pub pool:   AdaptiveAvgPool2d,
    pub head:   Linear<B>,
}

impl<B: Backend> ResNet<B> {
    /// images: [batch, 3, H, W] → raw class scores [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = relu(self.stem.forward(images));
        for block in self.blocks() {
            x = block.forward(x);
        }
        // [batch, 64, 1, 1] → [batch, 64]
        let x = self.pool.forward(x).flatten::<2>(1, 3);
        self.head.forward(x)
    }

    /// All residual blocks in execution order.
    pub fn blocks(&self) -> impl Iterator<Item = &ResidualBlock<B>> + '_ {
        self.stage1.iter().chain(&self.stage2).chain(&self.stage3)
    }

    pub fn block_count(&self) -> usize {
        self.stage1.len() + self.stage2.len() + self.stage3.len()
    }

    /// Weighted layers on the main path: stem + 2 per block + head.
    pub fn depth(&self) -> usize {
        2 * self.block_count() + 2
    }

    /// Every learnable tensor with a dotted name, e.g.
    /// `stage2.0.projection.weight`.
    pub fn named_params(&self) -> Vec<(String, ParamRef<'_, B>)> {
        let mut out = Vec::new();
        push_conv(&mut out, "stem".to_string(), &self.stem);

        for (stage_name, stage) in [("stage1", &self.stage1), ("stage2", &self.stage2), ("stage3", &self.stage3)] {
            for (i, block) in stage.iter().enumerate() {
                let prefix = format!("{stage_name}.{i}");
                push_conv(&mut out, format!("{prefix}.conv1"), &block.conv1);
                push_conv(&mut out, format!("{prefix}.conv2"), &block.conv2);
                if let Some(projection) = &block.projection {
                    push_conv(&mut out, format!("{prefix}.projection"), projection);
                }
            }
        }

        out.push(("head.weight".to_string(), ParamRef::Matrix(&self.head.weight)));
        if let Some(bias) = &self.head.bias {
            out.push(("head.bias".to_string(), ParamRef::Vector(bias)));
        }
        out
    }
}

fn push_conv<'a, B: Backend>(out: &mut Vec<(String, ParamRef<'a, B>)>, prefix: String, conv: &'a Conv2d<B>) {
    out.push((format!("{prefix}.weight"), ParamRef::Kernel(&conv.weight)));
    if let Some(bias) = &conv.bias {
        out.push((format!("{prefix}.bias"), ParamRef::Vector(bias)));
    }
}

/// Borrowed view of one parameter tensor, whatever its rank.
pub enum ParamRef<'a, B: Backend> {
    Vector(&'a Param<Tensor<B, 1>>),
    Matrix(&'a Param<Tensor<B, 2>>),
    Kernel(&'a Param<Tensor<B, 4>>),
}

impl<B: Backend> ParamRef<'_, B> {
    /// The parameter's values flattened to one dimension.
    pub fn flat(&self) -> Tensor<B, 1> {
        match self {
            ParamRef::Vector(p) => p.val(),
            ParamRef::Matrix(p) => p.val().flatten::<1>(0, 1),
            ParamRef::Kernel(p) => p.val().flatten::<1>(0, 3),
        }
    }

    pub fn l2_norm(&self) -> f64 {
        self.flat().powf_scalar(2.0).sum().sqrt().into_scalar().elem::<f64>()
    }
}

impl<B: AutodiffBackend> ParamRef<'_, B> {
    /// L2 norm of this parameter's gradient, if one was recorded.
    pub fn grad_l2_norm(&self, grads: &GradientsParams) -> Option<f64> {
        let flat: Tensor<B::InnerBackend, 1> = match self {
            ParamRef::Vector(p) => grads.get::<B::InnerBackend, 1>(p.id)?,
            ParamRef::Matrix(p) => grads.get::<B::InnerBackend, 2>(p.id)?.flatten::<1>(0, 1),
            ParamRef::Kernel(p) => grads.get::<B::InnerBackend, 4>(p.id)?.flatten::<1>(0, 3),
        };
        Some(flat.powf_scalar(2.0).sum().sqrt().into_scalar().elem::<f64>())
    }
}
