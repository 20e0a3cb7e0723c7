//! Input image access.
//!
//! This module provides the [`SampleImage`] trait through which the metric
//! reads pixel samples, and [`Image8`], an owned interleaved 8-bit image.
//!
//! ## Supported input types
//!
//! | Type | Channels | Notes |
//! |------|----------|-------|
//! | [`Image8`] | any | owned, interleaved |
//! | `image::ImageBuffer<P, C>` (`image` feature) | `P::CHANNEL_COUNT` | `P::Subpixel = u8` |
//! | `&T` where `T: SampleImage` | same as `T` | |
//!
//! ## Convention
//!
//! Samples are 8-bit, so the dynamic range is always [`DYNAMIC_RANGE`].
//! No color-space conversion is applied; every channel is compared as stored.

use crate::tile::Tile;
use crate::SsimError;

/// Maximum representable sample value.
pub const DYNAMIC_RANGE: u8 = u8::MAX;

/// Read-only access to the samples of a multi-channel 8-bit image.
///
/// Implement this trait to add support for custom image types.
pub trait SampleImage {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Number of channels per pixel (1 for grayscale, 3 for RGB, ...).
    fn channel_count(&self) -> usize;

    /// Sample of `channel` at `(x, y)`.
    ///
    /// Callers guarantee `x < width`, `y < height` and `channel < channel_count`.
    fn sample(&self, channel: usize, x: usize, y: usize) -> u8;

    /// Samples of one channel over `tile`, in row-major order.
    fn channel_data(&self, channel: usize, tile: Tile) -> ChannelSamples<'_, Self>
    where
        Self: Sized,
    {
        ChannelSamples {
            image: self,
            channel,
            tile,
            x: tile.x0,
            y: tile.y0,
        }
    }
}

impl<T: SampleImage + ?Sized> SampleImage for &T {
    #[inline]
    fn width(&self) -> usize {
        (**self).width()
    }

    #[inline]
    fn height(&self) -> usize {
        (**self).height()
    }

    #[inline]
    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    #[inline]
    fn sample(&self, channel: usize, x: usize, y: usize) -> u8 {
        (**self).sample(channel, x, y)
    }
}

/// Row-major iterator over one channel of a tile. See [`SampleImage::channel_data`].
#[derive(Clone, Debug)]
pub struct ChannelSamples<'a, I> {
    image: &'a I,
    channel: usize,
    tile: Tile,
    x: usize,
    y: usize,
}

impl<I: SampleImage> Iterator for ChannelSamples<'_, I> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.y >= self.tile.y1 || self.tile.x0 >= self.tile.x1 {
            return None;
        }
        let value = self.image.sample(self.channel, self.x, self.y);
        self.x += 1;
        if self.x == self.tile.x1 {
            self.x = self.tile.x0;
            self.y += 1;
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let width = self.tile.x1 - self.tile.x0;
        let remaining = if self.y >= self.tile.y1 {
            0
        } else {
            (self.tile.y1 - self.y) * width - (self.x - self.tile.x0)
        };
        (remaining, Some(remaining))
    }
}

impl<I: SampleImage> ExactSizeIterator for ChannelSamples<'_, I> {}

/// Owned 8-bit image with interleaved channels.
///
/// Pixel `(x, y)` occupies `data[(y * width + x) * channels..][..channels]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image8 {
    pub(crate) data: Vec<u8>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) channels: usize,
}

impl Image8 {
    /// Creates a new image from interleaved sample data.
    ///
    /// # Errors
    /// - If `width * height * channels` overflows `usize`
    /// - If `data.len() != width * height * channels`
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, SsimError> {
        let expected = buffer_len(width, height, channels)?;
        if data.len() != expected {
            return Err(SsimError::InvalidBufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image with every sample of every channel set to `value`.
    ///
    /// # Panics
    /// If `width * height * channels` overflows `usize`.
    #[must_use]
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Self {
        let len = buffer_len(width, height, channels).expect("image dimensions overflow usize");
        Self {
            data: vec![value; len],
            width,
            height,
            channels,
        }
    }

    /// Copies the samples of any [`SampleImage`].
    ///
    /// # Errors
    /// - If `width * height * channels` of `image` overflows `usize`
    pub fn from_sample_image<I: SampleImage + ?Sized>(image: &I) -> Result<Self, SsimError> {
        let (width, height, channels) = (image.width(), image.height(), image.channel_count());
        let mut data = Vec::with_capacity(buffer_len(width, height, channels)?);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(image.sample(c, x, y));
                }
            }
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Returns the interleaved sample data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns mutable interleaved sample data.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Sets the sample of `channel` at `(x, y)`.
    ///
    /// # Panics
    /// If `x >= width`, `y >= height` or `channel >= channels`.
    pub fn set_sample(&mut self, channel: usize, x: usize, y: usize, value: u8) {
        assert!(
            x < self.width && y < self.height && channel < self.channels,
            "sample ({}, {}, channel {}) out of bounds for {}x{}x{} image",
            x,
            y,
            channel,
            self.width,
            self.height,
            self.channels
        );
        let idx = self.index(channel, x, y);
        self.data[idx] = value;
    }

    #[inline]
    fn index(&self, channel: usize, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height && channel < self.channels);
        (y * self.width + x) * self.channels + channel
    }
}

/// Number of samples in a `width x height` image with `channels` channels.
fn buffer_len(width: usize, height: usize, channels: usize) -> Result<usize, SsimError> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(SsimError::ImageTooLarge {
            width,
            height,
            channels,
        })
}

impl SampleImage for Image8 {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn channel_count(&self) -> usize {
        self.channels
    }

    #[inline]
    fn sample(&self, channel: usize, x: usize, y: usize) -> u8 {
        self.data[self.index(channel, x, y)]
    }
}

// =============================================================================
// image crate implementations
// =============================================================================

#[cfg(feature = "image")]
mod image_impl {
    use super::SampleImage;
    use image::{ImageBuffer, Pixel};
    use std::ops::Deref;

    impl<P, C> SampleImage for ImageBuffer<P, C>
    where
        P: Pixel<Subpixel = u8>,
        C: Deref<Target = [u8]>,
    {
        #[inline]
        fn width(&self) -> usize {
            ImageBuffer::width(self) as usize
        }

        #[inline]
        fn height(&self) -> usize {
            ImageBuffer::height(self) as usize
        }

        #[inline]
        fn channel_count(&self) -> usize {
            usize::from(P::CHANNEL_COUNT)
        }

        #[inline]
        fn sample(&self, channel: usize, x: usize, y: usize) -> u8 {
            self.get_pixel(x as u32, y as u32).channels()[channel]
        }
    }
}
