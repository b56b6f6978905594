// THEORY:
// The `Pixel` module is the most fundamental unit of the pixelart engine. It is a
// "dumb" data container for a single RGB color value, with no knowledge of its
// neighbors, its position, or the palette. Anything that needs more than one pixel
// (block averaging, nearest-color matching) belongs in higher-level modules like
// `Pixelator` and `Palette`.
//
// Key architectural principles:
// 1.  **Value semantics**: A pixel is three bytes. It is `Copy`, immutable in
//     spirit, and cheap to move through the pipeline by the millions.
// 2.  **RGB only**: The converter quantizes color; transparency plays no part in
//     block averaging or palette matching, so alpha is stripped at the decode
//     boundary and never enters the core.
// 3.  **Byte-boundary conversions**: The decode/encode collaborators speak raw
//     byte slices; `From` impls at this boundary keep the rest of the engine free
//     of indexing arithmetic.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// The channels widened to `f64`, in the form `Palette::nearest` consumes.
        pub fn channels_f64(&self) -> [f64; CHANNELS] {
            [self.red as f64, self.green as f64, self.blue as f64]
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue]
        }
    }
}
