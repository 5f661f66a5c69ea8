// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An in-memory FITS container: an ordered list of HDUs, each a header of
//! typed keywords plus an optional 2D image.
//!
//! Image axes follow the row-major layout of the data: `x` is the slow axis
//! and `y` the fast one. In the file, `NAXIS1` is `y` and `NAXIS2` is `x`.

mod error;
#[cfg(test)]
mod tests;

pub use error::FitsError;

use std::{
    collections::BTreeMap,
    ffi::{c_void, CStr, CString},
    fmt::Display,
    os::raw::{c_char, c_int, c_long},
    panic::Location,
    path::Path,
    ptr,
};

use fitsio::{errors::check_status as fits_check_status, FitsFile};
use log::{debug, trace, warn};
use num_traits::NumCast;

// cfitsio data type codes.
const TBYTE: c_int = 11;
const TINT: c_int = 31;
const TFLOAT: c_int = 42;
const TDOUBLE: c_int = 82;

/// The length of a header card, including the NUL terminator.
const FLEN_CARD: usize = 81;

/// Keywords that cfitsio derives from the image itself. They are not kept in
/// a [`Hdu`]'s header.
const STRUCTURAL_KEYWORDS: [&str; 8] = [
    "SIMPLE", "BITPIX", "COMMENT", "EXTEND", "NAXIS", "XTENSION", "PCOUNT", "GCOUNT",
];

/// Bits per pixel of FITS image data (the BITPIX keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Byte = 8,
    Long = 32,
    Float = -32,
    Double = -64,
}

impl BitDepth {
    pub fn from_bitpix(bitpix: i32) -> Option<BitDepth> {
        match bitpix {
            8 => Some(BitDepth::Byte),
            32 => Some(BitDepth::Long),
            -32 => Some(BitDepth::Float),
            -64 => Some(BitDepth::Double),
            _ => None,
        }
    }

    pub fn bitpix(self) -> i32 {
        self as i32
    }

    /// The cfitsio type used to move pixels of this depth.
    fn datatype(self) -> c_int {
        match self {
            BitDepth::Byte => TBYTE,
            BitDepth::Long => TINT,
            BitDepth::Float => TFLOAT,
            BitDepth::Double => TDOUBLE,
        }
    }
}

/// Pixels of an image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Byte(Vec<u8>),
    Long(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl ImageData {
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            ImageData::Byte(_) => BitDepth::Byte,
            ImageData::Long(_) => BitDepth::Long,
            ImageData::Float(_) => BitDepth::Float,
            ImageData::Double(_) => BitDepth::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ImageData::Byte(v) => v.len(),
            ImageData::Long(v) => v.len(),
            ImageData::Float(v) => v.len(),
            ImageData::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw pixel bytes, in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ImageData::Byte(v) => v,
            ImageData::Long(v) => bytemuck::cast_slice(v),
            ImageData::Float(v) => bytemuck::cast_slice(v),
            ImageData::Double(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            ImageData::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Every pixel converted to single precision.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            ImageData::Byte(v) => v.iter().map(|&p| p as f32).collect(),
            ImageData::Long(v) => v.iter().map(|&p| p as f32).collect(),
            ImageData::Float(v) => v.clone(),
            ImageData::Double(v) => v.iter().map(|&p| p as f32).collect(),
        }
    }

    /// cfitsio wants a mutable pointer even when it only reads.
    fn as_raw_ptr(&self) -> *mut c_void {
        self.as_bytes().as_ptr() as *mut c_void
    }

    fn as_raw_mut_ptr(&mut self) -> *mut c_void {
        match self {
            ImageData::Byte(v) => v.as_mut_ptr().cast(),
            ImageData::Long(v) => v.as_mut_ptr().cast(),
            ImageData::Float(v) => v.as_mut_ptr().cast(),
            ImageData::Double(v) => v.as_mut_ptr().cast(),
        }
    }
}

impl From<Vec<u8>> for ImageData {
    fn from(v: Vec<u8>) -> Self {
        ImageData::Byte(v)
    }
}

impl From<Vec<i32>> for ImageData {
    fn from(v: Vec<i32>) -> Self {
        ImageData::Long(v)
    }
}

impl From<Vec<f32>> for ImageData {
    fn from(v: Vec<f32>) -> Self {
        ImageData::Float(v)
    }
}

impl From<Vec<f64>> for ImageData {
    fn from(v: Vec<f64>) -> Self {
        ImageData::Double(v)
    }
}

/// The value of a header keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Text(s) => write!(f, "'{s}'"),
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(s.to_string())
    }
}

macro_rules! integer_header_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for HeaderValue {
                fn from(i: $t) -> Self {
                    HeaderValue::Integer(i as i64)
                }
            }
        )*
    };
}
integer_header_value!(i16, i32, i64, u8, u16, u32);

impl From<f64> for HeaderValue {
    fn from(x: f64) -> Self {
        HeaderValue::Float(x)
    }
}

impl From<f32> for HeaderValue {
    fn from(x: f32) -> Self {
        HeaderValue::Float(x as f64)
    }
}

/// Types that can be pulled out of a [`HeaderValue`].
pub trait FromHeaderValue: Sized {
    const NAME: &'static str;

    fn from_header_value(value: &HeaderValue) -> Option<Self>;
}

impl FromHeaderValue for String {
    const NAME: &'static str = "text";

    fn from_header_value(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

macro_rules! integer_from_header_value {
    ($($t:ty),*) => {
        $(
            impl FromHeaderValue for $t {
                const NAME: &'static str = stringify!($t);

                fn from_header_value(value: &HeaderValue) -> Option<Self> {
                    match value {
                        HeaderValue::Integer(i) => NumCast::from(*i),
                        _ => None,
                    }
                }
            }
        )*
    };
}
integer_from_header_value!(i16, i32, i64, u8, u16, u32, u64, usize);

// Integers widen to floats.
macro_rules! float_from_header_value {
    ($($t:ty),*) => {
        $(
            impl FromHeaderValue for $t {
                const NAME: &'static str = stringify!($t);

                fn from_header_value(value: &HeaderValue) -> Option<Self> {
                    match value {
                        HeaderValue::Integer(i) => NumCast::from(*i),
                        HeaderValue::Float(x) => NumCast::from(*x),
                        _ => None,
                    }
                }
            }
        )*
    };
}
float_from_header_value!(f32, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEntry {
    pub value: HeaderValue,
    pub comment: String,
}

/// A header data unit.
#[derive(Debug, Clone, Default)]
pub struct Hdu {
    header: BTreeMap<String, HeaderEntry>,
    image: Option<ImageData>,
    x_dim: usize,
    y_dim: usize,
}

impl Hdu {
    pub fn new() -> Hdu {
        Hdu::default()
    }

    /// Stage an image of `x` rows of `y` pixels.
    pub fn set_image<D: Into<ImageData>>(
        &mut self,
        data: D,
        x: usize,
        y: usize,
    ) -> Result<(), FitsError> {
        let data = data.into();
        if data.len() != x * y {
            return Err(FitsError::ImageSize {
                got: data.len(),
                x,
                y,
            });
        }
        self.image = Some(data);
        self.x_dim = x;
        self.y_dim = y;
        Ok(())
    }

    /// Add a keyword, replacing any existing keyword of the same name.
    /// Non-finite floats are stored as 0.
    pub fn add_keyword<V: Into<HeaderValue>>(&mut self, key: &str, value: V, comment: &str) {
        let value = match value.into() {
            HeaderValue::Float(x) if !x.is_finite() => {
                warn!("The value for FITS keyword {key} ({x}) isn't valid; using 0");
                HeaderValue::Float(0.0)
            }
            v => v,
        };
        self.header.insert(
            key.to_string(),
            HeaderEntry {
                value,
                comment: comment.to_string(),
            },
        );
    }

    /// Get a keyword's value and comment.
    pub fn get_keyword<T: FromHeaderValue>(&self, key: &str) -> Result<(T, String), FitsError> {
        let entry = self
            .header
            .get(key)
            .ok_or_else(|| FitsError::MissingKey { key: key.into() })?;
        match T::from_header_value(&entry.value) {
            Some(v) => Ok((v, entry.comment.clone())),
            None => Err(FitsError::KeyType {
                key: key.into(),
                value: entry.value.to_string(),
                expected: T::NAME,
            }),
        }
    }

    pub fn header(&self) -> &BTreeMap<String, HeaderEntry> {
        &self.header
    }

    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    pub fn take_image(&mut self) -> Option<ImageData> {
        self.x_dim = 0;
        self.y_dim = 0;
        self.image.take()
    }

    pub fn x_dim(&self) -> usize {
        self.x_dim
    }

    pub fn y_dim(&self) -> usize {
        self.y_dim
    }

    pub fn bit_depth(&self) -> Option<BitDepth> {
        self.image.as_ref().map(ImageData::bit_depth)
    }
}

impl PartialEq for Hdu {
    /// HDUs are equal when their images are; headers are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.x_dim == other.x_dim
            && self.y_dim == other.y_dim
            && self.bit_depth() == other.bit_depth()
            && self.image.as_ref().map(ImageData::as_bytes)
                == other.image.as_ref().map(ImageData::as_bytes)
    }
}

/// An ordered collection of HDUs; the first is the primary HDU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsContainer {
    hdus: Vec<Hdu>,
}

impl FitsContainer {
    pub fn new() -> FitsContainer {
        FitsContainer::default()
    }

    pub fn push(&mut self, hdu: Hdu) {
        self.hdus.push(hdu);
    }

    pub fn insert(&mut self, index: usize, hdu: Hdu) {
        self.hdus.insert(index, hdu);
    }

    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hdu> {
        self.hdus.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Hdu> {
        self.hdus.iter_mut()
    }

    /// Write every HDU to `file`, replacing it if it exists.
    #[track_caller]
    pub fn to_file<P: AsRef<Path>>(&self, file: P) -> Result<(), FitsError> {
        write_hdus(self, file.as_ref(), None)
    }

    /// Read every HDU of `file`.
    #[track_caller]
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<FitsContainer, FitsError> {
        let file = file.as_ref();
        debug!("Reading FITS file '{}'", file.display());
        let mut fptr = fits_open(file)?;
        let raw = unsafe { fptr.as_raw() };

        let mut status = 0;
        let mut num_hdus = 0;
        unsafe {
            // ffthdu = fits_get_num_hdus
            fitsio_sys::ffthdu(raw, &mut num_hdus, &mut status);
        }
        fits_check(status, file, 0)?;

        let mut container = FitsContainer::new();
        for hdu_num in 1..=num_hdus {
            let hdu_index = hdu_num as usize;
            let mut hdu = Hdu::new();
            let mut num_keys = 0;
            unsafe {
                // ffmahd = fits_movabs_hdu
                fitsio_sys::ffmahd(raw, hdu_num, ptr::null_mut(), &mut status);
                fits_check(status, file, hdu_index)?;
                // ffghsp = fits_get_hdrspace
                fitsio_sys::ffghsp(raw, &mut num_keys, ptr::null_mut(), &mut status);
                fits_check(status, file, hdu_index)?;
            }

            let mut key_card = [0 as c_char; FLEN_CARD];
            let mut value_card = [0 as c_char; FLEN_CARD];
            let mut comment_card = [0 as c_char; FLEN_CARD];
            for key_num in 1..=num_keys {
                let (key, value, comment) = unsafe {
                    // ffgkyn = fits_read_keyn
                    fitsio_sys::ffgkyn(
                        raw,                         /* I - FITS file pointer     */
                        key_num,                     /* I - number of the keyword */
                        key_card.as_mut_ptr(),       /* O - keyword name          */
                        value_card.as_mut_ptr(),     /* O - keyword value         */
                        comment_card.as_mut_ptr(),   /* O - keyword comment       */
                        &mut status,                 /* IO - error status         */
                    );
                    fits_check(status, file, hdu_index)?;
                    (
                        CStr::from_ptr(key_card.as_ptr()).to_string_lossy().into_owned(),
                        CStr::from_ptr(value_card.as_ptr()).to_string_lossy().into_owned(),
                        CStr::from_ptr(comment_card.as_ptr()).to_string_lossy().into_owned(),
                    )
                };
                if is_structural_keyword(&key) {
                    continue;
                }
                trace!("HDU {hdu_index}: {key} = {value} / {comment}");
                hdu.add_keyword(&key, parse_header_value(&value), &comment);
            }

            let mut naxis = 0;
            unsafe {
                // ffgidm = fits_get_img_dim
                fitsio_sys::ffgidm(raw, &mut naxis, &mut status);
            }
            fits_check(status, file, hdu_index)?;
            match naxis {
                0 => (),
                2 => {
                    let mut bitpix = 0;
                    let mut naxes: [c_long; 2] = [0, 0];
                    unsafe {
                        // ffgidt = fits_get_img_type
                        fitsio_sys::ffgidt(raw, &mut bitpix, &mut status);
                        fits_check(status, file, hdu_index)?;
                        // ffgisz = fits_get_img_size
                        fitsio_sys::ffgisz(raw, 2, naxes.as_mut_ptr(), &mut status);
                        fits_check(status, file, hdu_index)?;
                    }
                    let bit_depth = BitDepth::from_bitpix(bitpix).ok_or_else(|| {
                        FitsError::UnsupportedBitpix {
                            fits_filename: file.to_path_buf().into_boxed_path(),
                            hdu_num: hdu_index,
                            bitpix,
                        }
                    })?;
                    let (y, x) = (naxes[0] as usize, naxes[1] as usize);
                    let mut data = match bit_depth {
                        BitDepth::Byte => ImageData::Byte(vec![0; x * y]),
                        BitDepth::Long => ImageData::Long(vec![0; x * y]),
                        BitDepth::Float => ImageData::Float(vec![0.0; x * y]),
                        BitDepth::Double => ImageData::Double(vec![0.0; x * y]),
                    };
                    unsafe {
                        // ffgpv = fits_read_img
                        fitsio_sys::ffgpv(
                            raw,                   /* I - FITS file pointer                 */
                            bit_depth.datatype(),  /* I - datatype of the array             */
                            1,                     /* I - first element to read (1 = 1st)   */
                            (x * y) as i64,        /* I - number of elements to read        */
                            ptr::null_mut(),       /* I - value for undefined pixels        */
                            data.as_raw_mut_ptr(), /* O - array of values that are returned */
                            ptr::null_mut(),       /* O - set to 1 if any values are null   */
                            &mut status,           /* IO - error status                     */
                        );
                    }
                    fits_check(status, file, hdu_index)?;
                    hdu.set_image(data, x, y)?;
                }
                _ => {
                    return Err(FitsError::UnsupportedDimensions {
                        fits_filename: file.to_path_buf().into_boxed_path(),
                        hdu_num: hdu_index,
                        naxis,
                    })
                }
            }
            container.push(hdu);
        }

        debug!("Read {} HDUs from '{}'", container.len(), file.display());
        Ok(container)
    }
}

impl std::ops::Index<usize> for FitsContainer {
    type Output = Hdu;

    fn index(&self, index: usize) -> &Hdu {
        &self.hdus[index]
    }
}

impl std::ops::IndexMut<usize> for FitsContainer {
    fn index_mut(&mut self, index: usize) -> &mut Hdu {
        &mut self.hdus[index]
    }
}

impl IntoIterator for FitsContainer {
    type Item = Hdu;
    type IntoIter = std::vec::IntoIter<Hdu>;

    fn into_iter(self) -> Self::IntoIter {
        self.hdus.into_iter()
    }
}

impl<'a> IntoIterator for &'a FitsContainer {
    type Item = &'a Hdu;
    type IntoIter = std::slice::Iter<'a, Hdu>;

    fn into_iter(self) -> Self::IntoIter {
        self.hdus.iter()
    }
}

/// Rewrite `container` into `file` the way the MWA offline correlator does:
/// every image is declared as 32-bit integers (BITPIX 32) while single
/// precision pixels are written into it. Readers expecting the correlator's
/// output need this.
#[track_caller]
pub fn write_float_as_long<P: AsRef<Path>>(
    container: &FitsContainer,
    file: P,
) -> Result<(), FitsError> {
    write_hdus(container, file.as_ref(), Some(BitDepth::Long))
}

/// Write every HDU of `container`. When `declared` is given, images are
/// created with that depth and their pixels written as floats.
#[track_caller]
fn write_hdus(
    container: &FitsContainer,
    file: &Path,
    declared: Option<BitDepth>,
) -> Result<(), FitsError> {
    let caller = Location::caller();
    // Delete any file that already exists.
    if file.exists() {
        std::fs::remove_file(file)?;
    }
    debug!("Writing {} HDUs to '{}'", container.len(), file.display());

    let c_filename = CString::new(file.display().to_string())
        .map_err(|_| FitsError::NulByte(file.display().to_string()))?;
    let mut fptr = ptr::null_mut();
    let mut status = 0;
    unsafe {
        // ffinit = fits_create_file
        fitsio_sys::ffinit(
            &mut fptr as *mut *mut _, /* O - FITS file pointer      */
            c_filename.as_ptr(),      /* I - name of file to create */
            &mut status,              /* IO - error status          */
        );
    }
    fits_check_status(status).map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })?;

    let result = container
        .iter()
        .enumerate()
        .try_for_each(|(i, hdu)| write_hdu(fptr, hdu, file, i + 1, declared));

    // Close the file even if a HDU couldn't be written.
    let mut close_status = 0;
    unsafe {
        // ffclos = fits_close_file
        fitsio_sys::ffclos(fptr, &mut close_status);
    }
    result?;
    fits_check(close_status, file, container.len())
}

fn write_hdu(
    fptr: *mut fitsio_sys::fitsfile,
    hdu: &Hdu,
    file: &Path,
    hdu_num: usize,
    declared: Option<BitDepth>,
) -> Result<(), FitsError> {
    let mut status = 0;
    match hdu.image() {
        // Header-only HDU.
        None => unsafe {
            // ffcrim = fits_create_img
            fitsio_sys::ffcrim(fptr, BitDepth::Long.bitpix(), 0, ptr::null_mut(), &mut status);
            fits_check(status, file, hdu_num)?;
        },

        Some(image) => {
            let mut naxes: [c_long; 2] = [hdu.y_dim() as c_long, hdu.x_dim() as c_long];
            let bitpix = declared.unwrap_or_else(|| image.bit_depth()).bitpix();
            // The declared depth is only a label; the pixels go in as floats.
            let floats;
            let (datatype, pixels) = match declared {
                Some(_) => {
                    floats = image.to_f32_vec();
                    (TFLOAT, floats.as_ptr() as *mut c_void)
                }
                None => (image.bit_depth().datatype(), image.as_raw_ptr()),
            };
            unsafe {
                // ffcrim = fits_create_img
                fitsio_sys::ffcrim(fptr, bitpix, 2, naxes.as_mut_ptr(), &mut status);
                fits_check(status, file, hdu_num)?;
                // ffppr = fits_write_img
                fitsio_sys::ffppr(
                    fptr,               /* I - FITS file pointer                       */
                    datatype,           /* I - datatype of the array                   */
                    1,                  /* I - first element to write (1 = 1st)        */
                    image.len() as i64, /* I - number of values to write               */
                    pixels,             /* I - array of values that are written        */
                    &mut status,        /* IO - error status                           */
                );
                fits_check(status, file, hdu_num)?;
            }
        }
    }

    for (key, entry) in hdu.header() {
        let c_key = CString::new(key.as_str()).map_err(|_| FitsError::NulByte(key.clone()))?;
        let c_comment = CString::new(entry.comment.as_str())
            .map_err(|_| FitsError::NulByte(entry.comment.clone()))?;
        unsafe {
            match &entry.value {
                HeaderValue::Text(s) => {
                    let c_value =
                        CString::new(s.as_str()).map_err(|_| FitsError::NulByte(s.clone()))?;
                    // ffukys = fits_update_key_str
                    fitsio_sys::ffukys(
                        fptr,
                        c_key.as_ptr(),
                        c_value.as_ptr(),
                        c_comment.as_ptr(),
                        &mut status,
                    );
                }
                HeaderValue::Integer(i) => {
                    // ffukyj = fits_update_key_lng
                    fitsio_sys::ffukyj(fptr, c_key.as_ptr(), *i, c_comment.as_ptr(), &mut status);
                }
                HeaderValue::Float(x) => {
                    // ffukyd = fits_update_key_dbl; negative decimals select
                    // %G formatting with that many significant digits.
                    fitsio_sys::ffukyd(
                        fptr,
                        c_key.as_ptr(),
                        *x,
                        -15,
                        c_comment.as_ptr(),
                        &mut status,
                    );
                }
            }
        }
        fits_check(status, file, hdu_num)?;
    }
    Ok(())
}

/// Open a fits file.
#[track_caller]
fn fits_open(file: &Path) -> Result<FitsFile, FitsError> {
    let caller = Location::caller();
    FitsFile::open(file).map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.to_path_buf().into_boxed_path(),
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

/// Turn a cfitsio status into a [`FitsError`].
#[track_caller]
fn fits_check(status: c_int, file: &Path, hdu_num: usize) -> Result<(), FitsError> {
    let caller = Location::caller();
    fits_check_status(status).map_err(|e| FitsError::Fitsio {
        fits_error: Box::new(e),
        fits_filename: file.to_path_buf().into_boxed_path(),
        hdu_num,
        source_file: caller.file(),
        source_line: caller.line(),
        source_column: caller.column(),
    })
}

fn is_structural_keyword(key: &str) -> bool {
    if key.is_empty() || STRUCTURAL_KEYWORDS.contains(&key) {
        return true;
    }
    // NAXISn
    match key.strip_prefix("NAXIS") {
        Some(n) => n.parse::<u32>().is_ok(),
        None => false,
    }
}

/// Type a keyword value as cfitsio prints it: integer, else float, else text
/// with its quotes removed.
fn parse_header_value(raw: &str) -> HeaderValue {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return HeaderValue::Integer(i);
    }
    // FITS allows a 'D' exponent for doubles.
    if let Ok(x) = raw.replace('D', "E").parse::<f64>() {
        if !raw.starts_with('\'') {
            return HeaderValue::Float(x);
        }
    }
    let text = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    HeaderValue::Text(text.trim_end().replace("''", "'"))
}
