use super::ConfigError;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use ndarray::{Array4, ArrayView4, ArrayViewMut4};

/// Adapter trait for reading a flat tensor buffer.
///
/// The buffer is interpreted through a [`crate::layout::Shape4`] and
/// [`crate::layout::Layout`] supplied by the kernel config, so any memory
/// order is accepted as long as the elements are contiguous.
pub trait ReadBuf<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing a flat tensor buffer.
pub trait WriteBuf<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> ReadBuf<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> WriteBuf<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> ReadBuf<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> WriteBuf<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

#[cfg(feature = "alloc")]
impl<T> ReadBuf<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> WriteBuf<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

// ndarray tensors are read in memory order; standard and Fortran layouts
// both qualify, anything with gaps does not.

#[cfg(feature = "alloc")]
impl<T> ReadBuf<T> for Array4<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice_memory_order()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

#[cfg(feature = "alloc")]
impl<T> WriteBuf<T> for Array4<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_memory_order_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

#[cfg(feature = "alloc")]
impl<'a, T> ReadBuf<T> for ArrayView4<'a, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice_memory_order()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

#[cfg(feature = "alloc")]
impl<'a, T> WriteBuf<T> for ArrayViewMut4<'a, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_memory_order_mut()
            .ok_or(ConfigError::NonContiguous {
                arg: "array_view_mut",
            })
    }
}
