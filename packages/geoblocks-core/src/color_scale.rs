// Depth-keyed block colors

const DEPTH_DOMAIN: [f64; 2] = [10.0, 20.0];
const LOW_COLOR: [u8; 3] = [0xfe, 0xe3, 0x2f];
const HIGH_COLOR: [u8; 3] = [0xfc, 0x44, 0x27];

/// Linear RGB interpolation between two colors over a numeric domain.
///
/// Values outside the domain extrapolate; channels are then rounded and
/// clamped to a byte.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    domain: [f64; 2],
    range: [[u8; 3]; 2],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(DEPTH_DOMAIN, [LOW_COLOR, HIGH_COLOR])
    }
}

impl ColorScale {
    pub fn new(domain: [f64; 2], range: [[u8; 3]; 2]) -> Self {
        Self { domain, range }
    }

    pub fn rgb(&self, value: f64) -> [u8; 3] {
        let span = self.domain[1] - self.domain[0];
        let t = if span != 0.0 { (value - self.domain[0]) / span } else { 0.5 };

        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            let a = self.range[0][i] as f64;
            let b = self.range[1][i] as f64;
            *channel = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Linear RGBA factor for a glTF `baseColorFactor`.
    pub fn linear_rgba(&self, value: f64) -> [f32; 4] {
        let [r, g, b] = self.rgb(value);
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), 1.0]
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f64 / 255.0;
    let linear = if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    };
    linear as f32
}
