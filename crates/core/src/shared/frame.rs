use super::channel::SensorChannel;

/// Byte layout of an 8-bit [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Bgr8,
    Gray8,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single 8-bit image: contiguous bytes in row-major order.
///
/// Frames are allocated once per session and overwritten in place by the
/// frame source, so the buffer length never changes after construction.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (format.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    /// Zero-filled frame, used as the reusable capture buffer.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = (width as usize) * (height as usize) * (format.channels() as usize);
        Self::new(vec![0; len], width, height, format, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Pixel at `(x, y)` as red, green, blue regardless of layout.
    /// Gray pixels are replicated across the three channels.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let c = self.channels() as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        match self.format {
            PixelFormat::Rgb8 => [self.data[idx], self.data[idx + 1], self.data[idx + 2]],
            PixelFormat::Bgr8 => [self.data[idx + 2], self.data[idx + 1], self.data[idx]],
            PixelFormat::Gray8 => [self.data[idx]; 3],
        }
    }
}

/// A single 16-bit sample grid from the depth or infrared sensor.
#[derive(Clone, Debug)]
pub struct SampleFrame {
    data: Vec<u16>,
    width: u32,
    height: u32,
    channel: SensorChannel,
    index: usize,
}

impl SampleFrame {
    pub fn new(
        data: Vec<u16>,
        width: u32,
        height: u32,
        channel: SensorChannel,
        index: usize,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        debug_assert_ne!(channel, SensorChannel::Color, "color frames are 8-bit");
        Self {
            data,
            width,
            height,
            channel,
            index,
        }
    }

    pub fn blank(width: u32, height: u32, channel: SensorChannel) -> Self {
        Self::new(
            vec![0; (width as usize) * (height as usize)],
            width,
            height,
            channel,
            0,
        )
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel(&self) -> SensorChannel {
        self.channel
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}
