//! Drawing surfaces for resampling, with a checkout/return pool.
//!
//! A [`Surface`] is a reusable RGB buffer that one transcode resamples into
//! and encodes from. Each in-flight transcode holds its own surface through a
//! [`PooledSurface`] guard, so concurrent resamples never share state. When
//! the guard drops, the surface goes back to the pool with its allocation
//! intact.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use crate::decode::{resample_into, DecodedImage, FilterType};
use crate::encode::EncodeError;

/// An RGB drawing buffer.
#[derive(Debug, Default)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `src` scaled to `width x height`, replacing the current contents.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::InvalidDimensions` for a zero width or height and
    /// `EncodeError::InvalidPixelData` if `src` is not a packed RGB buffer of
    /// its declared size. The surface is left empty on error.
    pub fn draw(
        &mut self,
        src: &DecodedImage,
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<(), EncodeError> {
        self.width = 0;
        self.height = 0;
        resample_into(src, width, height, filter, &mut self.pixels)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed RGB pixels of the last draw.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Allocated buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.pixels.capacity()
    }
}

/// Pool of idle surfaces.
#[derive(Debug)]
pub struct SurfacePool {
    idle: Mutex<Vec<Surface>>,
    capacity: usize,
}

impl SurfacePool {
    /// Create a pool that keeps at most `capacity` idle surfaces.
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Take an idle surface, or a fresh one when none is idle.
    pub fn checkout(&self) -> PooledSurface<'_> {
        let surface = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        PooledSurface {
            pool: self,
            surface,
        }
    }

    /// Number of surfaces waiting to be reused.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn give_back(&self, surface: Surface) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(surface);
        }
    }
}

/// A surface checked out of a [`SurfacePool`]; returned on drop.
#[derive(Debug)]
pub struct PooledSurface<'a> {
    pool: &'a SurfacePool,
    surface: Surface,
}

impl Deref for PooledSurface<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.surface
    }
}

impl DerefMut for PooledSurface<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }
}

impl Drop for PooledSurface<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.surface));
    }
}
