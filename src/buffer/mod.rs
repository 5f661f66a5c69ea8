// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A typed, contiguous array that lives in one of three kinds of memory:
//! ordinary host memory, pinned (page-locked) host memory, or GPU device
//! memory.
//!
//! All data products (voltages, visibilities and images) own one of these.
//! The storage is tagged with its kind, so freeing it is a single drop of
//! whichever allocation is current.

mod error;

pub use error::BufferError;

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    ops::{Index, IndexMut},
    path::Path,
};

use bytemuck::Pod;
use log::trace;
use strum_macros::{Display, EnumIter};

#[cfg(any(feature = "cuda", feature = "hip"))]
use crate::gpu::{DevicePointer, PinnedHostPointer};

/// Where the elements of a [`MemoryBuffer`] live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MemoryKind {
    #[strum(serialize = "host heap")]
    HostHeap,

    #[strum(serialize = "pinned host")]
    HostPinned,

    #[strum(serialize = "device")]
    Device,
}

impl MemoryKind {
    /// Get the kind of memory described by the pair of flags. Pinned device
    /// memory doesn't exist.
    pub fn from_flags(pinned: bool, on_device: bool) -> Result<MemoryKind, BufferError> {
        match (pinned, on_device) {
            (true, true) => Err(BufferError::PinnedAndDevice),
            (true, false) => Ok(MemoryKind::HostPinned),
            (false, true) => Ok(MemoryKind::Device),
            (false, false) => Ok(MemoryKind::HostHeap),
        }
    }

    /// Is this kind of memory available in this build?
    pub fn is_supported(self) -> bool {
        match self {
            MemoryKind::HostHeap => true,
            MemoryKind::HostPinned | MemoryKind::Device => {
                cfg!(any(feature = "cuda", feature = "hip"))
            }
        }
    }
}

#[derive(Debug)]
enum Storage<T> {
    Host(Vec<T>),

    #[cfg(any(feature = "cuda", feature = "hip"))]
    Pinned(PinnedHostPointer<T>),

    #[cfg(any(feature = "cuda", feature = "hip"))]
    Device(DevicePointer<T>),
}

/// An owned array of `T` in host, pinned-host or device memory.
///
/// Moving a `MemoryBuffer` transfers its allocation; the moved-from binding
/// can no longer be used. Copies must be explicit with
/// [`MemoryBuffer::try_clone`], because copying device memory can fail.
#[derive(Debug)]
pub struct MemoryBuffer<T: Pod> {
    storage: Storage<T>,
    len: usize,
}

impl<T: Pod> MemoryBuffer<T> {
    /// Allocate a zeroed buffer of `len` elements in the requested kind of
    /// memory.
    pub fn new(len: usize, kind: MemoryKind) -> Result<MemoryBuffer<T>, BufferError> {
        if !kind.is_supported() {
            return Err(BufferError::NoGpuSupport(kind));
        }
        if len == 0 {
            return Err(BufferError::ZeroLength);
        }

        let storage = match kind {
            MemoryKind::HostHeap => Storage::Host(vec![T::zeroed(); len]),

            #[cfg(any(feature = "cuda", feature = "hip"))]
            MemoryKind::HostPinned => Storage::Pinned(PinnedHostPointer::alloc_zeroed(len)?),

            #[cfg(any(feature = "cuda", feature = "hip"))]
            MemoryKind::Device => {
                let mut d = DevicePointer::malloc(len * std::mem::size_of::<T>())?;
                d.clear();
                Storage::Device(d)
            }

            #[cfg(not(any(feature = "cuda", feature = "hip")))]
            k => return Err(BufferError::NoGpuSupport(k)),
        };
        trace!("Allocated {len} elements of {kind} memory");
        Ok(MemoryBuffer { storage, len })
    }

    /// Allocate a zeroed buffer of `len` elements. `pinned` and `on_device`
    /// can't both be set, and neither can be set without GPU support.
    pub fn allocate(
        len: usize,
        pinned: bool,
        on_device: bool,
    ) -> Result<MemoryBuffer<T>, BufferError> {
        let kind = MemoryKind::from_flags(pinned, on_device)?;
        Self::new(len, kind)
    }

    /// Take ownership of already-populated host memory.
    pub fn from_vec(v: Vec<T>) -> Result<MemoryBuffer<T>, BufferError> {
        if v.is_empty() {
            return Err(BufferError::ZeroLength);
        }
        Ok(MemoryBuffer {
            len: v.len(),
            storage: Storage::Host(v),
        })
    }

    /// Take ownership of already-populated device memory.
    #[cfg(any(feature = "cuda", feature = "hip"))]
    pub fn from_device_pointer(d: DevicePointer<T>) -> Result<MemoryBuffer<T>, BufferError> {
        if d.get().is_null() {
            return Err(BufferError::NullPointer);
        }
        let len = d.get_num_elements();
        if len == 0 {
            return Err(BufferError::ZeroLength);
        }
        Ok(MemoryBuffer {
            storage: Storage::Device(d),
            len,
        })
    }

    /// Take ownership of already-populated pinned host memory.
    #[cfg(any(feature = "cuda", feature = "hip"))]
    pub fn from_pinned(p: PinnedHostPointer<T>) -> Result<MemoryBuffer<T>, BufferError> {
        if p.len() == 0 {
            return Err(BufferError::ZeroLength);
        }
        Ok(MemoryBuffer {
            len: p.len(),
            storage: Storage::Pinned(p),
        })
    }

    pub fn kind(&self) -> MemoryKind {
        match &self.storage {
            Storage::Host(_) => MemoryKind::HostHeap,
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(_) => MemoryKind::HostPinned,
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(_) => MemoryKind::Device,
        }
    }

    /// The number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; buffers can't be empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_on_device(&self) -> bool {
        self.kind() == MemoryKind::Device
    }

    pub fn is_pinned(&self) -> bool {
        self.kind() == MemoryKind::HostPinned
    }

    /// A pointer to the first element, wherever it lives. This is only useful
    /// for identity checks and FFI.
    pub fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::Host(v) => v.as_ptr(),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => p.as_slice().as_ptr(),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(d) => d.get(),
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.storage {
            Storage::Host(v) => v.as_mut_ptr(),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => p.as_mut_slice().as_mut_ptr(),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(d) => d.get_mut(),
        }
    }

    /// Move the data to host memory. Nothing happens if the data are already
    /// on the host. `pinned` picks the kind of host memory used when the data
    /// have to leave the device.
    pub fn to_host(&mut self, pinned: bool) -> Result<(), BufferError> {
        let _ = pinned;
        #[cfg(any(feature = "cuda", feature = "hip"))]
        if let Storage::Device(d) = &self.storage {
            let storage = if pinned {
                let mut p = PinnedHostPointer::alloc_zeroed(self.len)?;
                d.copy_from_device(p.as_mut_slice())?;
                Storage::Pinned(p)
            } else {
                let mut v = vec![T::zeroed(); self.len];
                d.copy_from_device(&mut v)?;
                Storage::Host(v)
            };
            // The device allocation is freed as it is replaced.
            self.storage = storage;
            trace!("Moved {} elements from the device to the host", self.len);
        }
        Ok(())
    }

    /// Move the data to device memory. Nothing happens if the data are already
    /// on the device. This fails on builds without GPU support.
    pub fn to_device(&mut self) -> Result<(), BufferError> {
        cfg_if::cfg_if! {
            if #[cfg(any(feature = "cuda", feature = "hip"))] {
                let d = match &self.storage {
                    Storage::Device(_) => return Ok(()),
                    Storage::Host(v) => DevicePointer::copy_to_device(v)?,
                    Storage::Pinned(p) => DevicePointer::copy_to_device(p.as_slice())?,
                };
                self.storage = Storage::Device(d);
                trace!("Moved {} elements from the host to the device", self.len);
                Ok(())
            } else {
                Err(BufferError::NoGpuSupport(MemoryKind::Device))
            }
        }
    }

    /// Borrow the elements. Fails if they live on the device.
    pub fn as_slice(&self) -> Result<&[T], BufferError> {
        match &self.storage {
            Storage::Host(v) => Ok(v),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => Ok(p.as_slice()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(_) => Err(BufferError::NotOnHost(MemoryKind::Device)),
        }
    }

    /// Mutably borrow the elements. Fails if they live on the device.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T], BufferError> {
        match &mut self.storage {
            Storage::Host(v) => Ok(v),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => Ok(p.as_mut_slice()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(_) => Err(BufferError::NotOnHost(MemoryKind::Device)),
        }
    }

    #[cfg(any(feature = "cuda", feature = "hip"))]
    pub fn device_pointer(&self) -> Option<&DevicePointer<T>> {
        match &self.storage {
            Storage::Device(d) => Some(d),
            _ => None,
        }
    }

    #[cfg(any(feature = "cuda", feature = "hip"))]
    pub fn device_pointer_mut(&mut self) -> Option<&mut DevicePointer<T>> {
        match &mut self.storage {
            Storage::Device(d) => Some(d),
            _ => None,
        }
    }

    /// Set every element to zero.
    pub fn fill_zero(&mut self) {
        match &mut self.storage {
            Storage::Host(v) => v.fill(T::zeroed()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => p.as_mut_slice().fill(T::zeroed()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(d) => d.clear(),
        }
    }

    /// Copy the elements into a new `Vec`, wherever they live. The buffer is
    /// left as it is.
    pub fn to_vec(&self) -> Result<Vec<T>, BufferError> {
        match &self.storage {
            Storage::Host(v) => Ok(v.clone()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => Ok(p.as_slice().to_vec()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(d) => {
                let mut v = vec![T::zeroed(); self.len];
                d.copy_from_device(&mut v)?;
                Ok(v)
            }
        }
    }

    /// Deep copy the buffer into a new allocation of the same kind.
    pub fn try_clone(&self) -> Result<MemoryBuffer<T>, BufferError> {
        let storage = match &self.storage {
            Storage::Host(v) => Storage::Host(v.clone()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => Storage::Pinned(PinnedHostPointer::from_slice(p.as_slice())?),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(d) => Storage::Device(d.duplicate()?),
        };
        Ok(MemoryBuffer {
            storage,
            len: self.len,
        })
    }

    /// Write the raw bytes of the elements to a file. Device data are copied
    /// back to the host for writing; the buffer itself stays on the device.
    pub fn dump<P: AsRef<Path>>(&self, file: P) -> Result<(), BufferError> {
        let mut writer = BufWriter::new(File::create(file.as_ref())?);
        match self.as_slice() {
            Ok(s) => writer.write_all(bytemuck::cast_slice(s))?,
            Err(_) => writer.write_all(bytemuck::cast_slice(&self.to_vec()?))?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a file written by [`MemoryBuffer::dump`] into a new host buffer.
    pub fn from_dump<P: AsRef<Path>>(file: P) -> Result<MemoryBuffer<T>, BufferError> {
        let file = file.as_ref();
        let mut bytes = vec![];
        File::open(file)?.read_to_end(&mut bytes)?;
        let element_size = std::mem::size_of::<T>();
        if bytes.is_empty() || bytes.len() % element_size != 0 {
            return Err(BufferError::BadDumpSize {
                file: file.to_path_buf(),
                size: bytes.len(),
                element_size,
            });
        }

        let mut v = vec![T::zeroed(); bytes.len() / element_size];
        bytemuck::cast_slice_mut::<T, u8>(&mut v).copy_from_slice(&bytes);
        Self::from_vec(v)
    }
}

/// Element access is a hot-path operation with no kind check beyond a match.
/// Panics if the data are on the device.
impl<T: Pod> Index<usize> for MemoryBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match &self.storage {
            Storage::Host(v) => &v[index],
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => &p.as_slice()[index],
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(_) => panic!("cannot index device memory from the host"),
        }
    }
}

impl<T: Pod> IndexMut<usize> for MemoryBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match &mut self.storage {
            Storage::Host(v) => &mut v[index],
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Pinned(p) => &mut p.as_mut_slice()[index],
            #[cfg(any(feature = "cuda", feature = "hip"))]
            Storage::Device(_) => panic!("cannot index device memory from the host"),
        }
    }
}
