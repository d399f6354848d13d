use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig, ConvTranspose1d, ConvTranspose1dConfig},
        loss::{MseLoss, Reduction},
        pool::{MaxPool1d, MaxPool1dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::{leaky_relu, tanh},
};

// Every field has a default, so `UNetConfig::new()` builds the
// standard architecture with no arguments.
#[derive(Config, Debug)]
pub struct UNetConfig {
    #[config(default = 1)]
    pub in_channels:    usize,
    /// Number of down/up-sampling levels
    #[config(default = 6)]
    pub depth:          usize,
    /// Channels added per level
    #[config(default = 24)]
    pub base_channels:  usize,
    #[config(default = 15)]
    pub encoder_kernel: usize,
    #[config(default = 5)]
    pub decoder_kernel: usize,
    #[config(default = 0.1)]
    pub leaky_slope:    f64,
}

impl UNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> UNet<B> {
        let c = self.base_channels;

        let encoder = (0..self.depth)
            .map(|i| {
                let c_in = if i == 0 { self.in_channels } else { c * i };
                self.conv_block(c_in, c * (i + 1), self.encoder_kernel, device)
            })
            .collect();

        let bottleneck = self.conv_block(c * self.depth, c * (self.depth + 1), self.encoder_kernel, device);

        // Deepest level first, matching the order skips are popped.
        let decoder = (0..self.depth)
            .rev()
            .map(|i| self.decoder_block(c * (i + 2), c * (i + 1), device))
            .collect();

        let output = Conv1dConfig::new(c + self.in_channels, self.in_channels, 1).init(device);

        UNet {
            encoder,
            bottleneck,
            decoder,
            pool: MaxPool1dConfig::new(2).with_stride(2).init(),
            output,
            depth: self.depth,
        }
    }

    fn conv_block<B: Backend>(
        &self,
        c_in:   usize,
        c_out:  usize,
        kernel: usize,
        device: &B::Device,
    ) -> ConvBlock<B> {
        let conv = Conv1dConfig::new(c_in, c_out, kernel)
            .with_padding(PaddingConfig1d::Explicit(kernel / 2))
            .init(device);
        let norm = BatchNormConfig::new(c_out).init(device);
        ConvBlock { conv, norm, slope: self.leaky_slope }
    }

    fn decoder_block<B: Backend>(&self, c_up: usize, c_skip: usize, device: &B::Device) -> DecoderBlock<B> {
        let upsample = ConvTranspose1dConfig::new([c_up, c_up], 2)
            .with_stride(2)
            .init(device);
        let conv = self.conv_block(c_up + c_skip, c_skip, self.decoder_kernel, device);
        DecoderBlock { upsample, conv }
    }

    /// Input lengths must be a multiple of this.
    pub fn length_multiple(&self) -> usize {
        1 << self.depth
    }
}

/// Conv1d → BatchNorm → LeakyReLU, length preserving (odd kernels).
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:  Conv1d<B>,
    pub norm:  BatchNorm<B, 1>,
    pub slope: f64,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        leaky_relu(self.norm.forward(self.conv.forward(x)), self.slope)
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub upsample: ConvTranspose1d<B>,
    pub conv:     ConvBlock<B>,
}

impl<B: Backend> DecoderBlock<B> {
    /// Doubles the time axis, then fuses the encoder skip.
    pub fn forward(&self, x: Tensor<B, 3>, skip: Tensor<B, 3>) -> Tensor<B, 3> {
        let up = self.upsample.forward(x);
        self.conv.forward(Tensor::cat(vec![up, skip], 1))
    }
}

#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    pub encoder:    Vec<ConvBlock<B>>,
    pub bottleneck: ConvBlock<B>,
    pub decoder:    Vec<DecoderBlock<B>>,
    pub pool:       MaxPool1d,
    pub output:     Conv1d<B>,
    pub depth:      usize,
}

impl<B: Backend> UNet<B> {
    /// noisy: [batch, channels, samples] → enhanced, same shape, in [-1, 1]
    pub fn forward(&self, noisy: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut skips = Vec::with_capacity(self.depth);
        let mut x = noisy.clone();

        for block in &self.encoder {
            x = block.forward(x);
            skips.push(x.clone());
            x = self.pool.forward(x);
        }

        x = self.bottleneck.forward(x);

        for block in &self.decoder {
            // decoder and skips have the same length
            if let Some(skip) = skips.pop() {
                x = block.forward(x, skip);
            }
        }

        // The raw input goes straight to the last layer as well.
        tanh(self.output.forward(Tensor::cat(vec![x, noisy], 1)))
    }

    /// Mean squared error between the enhanced signal and the target.
    pub fn forward_loss(&self, noisy: Tensor<B, 3>, clean: Tensor<B, 3>) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let enhanced = self.forward(noisy);
        let loss = MseLoss::new().forward(enhanced.clone(), clean, Reduction::Mean);
        (loss, enhanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn small() -> UNetConfig {
        UNetConfig::new().with_depth(2).with_base_channels(4)
    }

    #[test]
    fn test_default_architecture() {
        let cfg = UNetConfig::new();
        assert_eq!(cfg.depth, 6);
        assert_eq!(cfg.in_channels, 1);
        assert_eq!(cfg.length_multiple(), 64);
    }

    #[test]
    fn test_forward_preserves_shape() {
        let device = Default::default();
        let model: UNet<NdArray> = small().init(&device);
        let x = Tensor::<NdArray, 3>::zeros([2, 1, 32], &device);
        assert_eq!(model.forward(x).dims(), [2, 1, 32]);
    }

    #[test]
    fn test_output_is_bounded() {
        let device = Default::default();
        let model: UNet<NdArray> = small().init(&device);
        let x = Tensor::<NdArray, 3>::ones([1, 1, 16], &device) * 5.0;
        let out: Vec<f32> = model.forward(x).into_data().to_vec::<f32>().unwrap();
        assert!(out.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn test_loss_is_scalar_and_finite() {
        let device = Default::default();
        let model: UNet<NdArray> = small().init(&device);
        let noisy = Tensor::<NdArray, 3>::zeros([2, 1, 16], &device);
        let clean = Tensor::<NdArray, 3>::ones([2, 1, 16], &device) * 0.5;
        let (loss, enhanced) = model.forward_loss(noisy, clean);
        assert_eq!(enhanced.dims(), [2, 1, 16]);
        let value: f32 = loss.into_scalar().elem();
        assert!(value.is_finite());
    }
}
