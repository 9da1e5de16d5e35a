use std::fs::File;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::consts::{FITS_BLOCK_SIZE, FITS_CARD_SIZE};
use crate::error::{Result, StarShrinkError};

/// A single 80-byte header record.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderCard {
    pub keyword: String,
    /// Value field with quotes and inline comment stripped. `None` for
    /// commentary cards (COMMENT, HISTORY, blank keyword).
    pub value: Option<String>,
}

/// Parsed header of one HDU.
#[derive(Clone, Debug)]
pub struct FitsHeader {
    pub bitpix: i32,
    /// Axis lengths in NAXIS order: NAXIS1 (width) first.
    pub axes: Vec<usize>,
    pub bscale: f64,
    pub bzero: f64,
    pub blank: Option<i64>,
    pub cards: Vec<HeaderCard>,
}

impl FitsHeader {
    fn from_cards(cards: Vec<HeaderCard>) -> Result<Self> {
        let find = |key: &str| {
            cards
                .iter()
                .find(|c| c.keyword == key)
                .and_then(|c| c.value.clone())
        };

        let bitpix = find("BITPIX")
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| StarShrinkError::InvalidFits("Missing or invalid BITPIX".into()))?;
        if !matches!(bitpix, 8 | 16 | 32 | 64 | -32 | -64) {
            return Err(StarShrinkError::InvalidFits(format!(
                "Unsupported BITPIX {bitpix}"
            )));
        }

        let naxis = find("NAXIS")
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| StarShrinkError::InvalidFits("Missing or invalid NAXIS".into()))?;
        let mut axes = Vec::with_capacity(naxis);
        for i in 1..=naxis {
            let len = find(&format!("NAXIS{i}"))
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| StarShrinkError::InvalidFits(format!("Missing NAXIS{i}")))?;
            axes.push(len);
        }

        let bscale = find("BSCALE").and_then(|v| parse_float(&v)).unwrap_or(1.0);
        let bzero = find("BZERO").and_then(|v| parse_float(&v)).unwrap_or(0.0);
        let blank = find("BLANK").and_then(|v| v.parse::<i64>().ok());

        Ok(Self {
            bitpix,
            axes,
            bscale,
            bzero,
            blank,
            cards,
        })
    }

    /// Look up a keyword's value field.
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|c| c.keyword == keyword)
            .and_then(|c| c.value.as_deref())
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(parse_float)
    }

    pub fn object(&self) -> Option<&str> {
        self.get("OBJECT").filter(|s| !s.is_empty())
    }

    pub fn telescope(&self) -> Option<&str> {
        self.get("TELESCOP").filter(|s| !s.is_empty())
    }

    pub fn instrument(&self) -> Option<&str> {
        self.get("INSTRUME").filter(|s| !s.is_empty())
    }

    pub fn date_obs(&self) -> Option<&str> {
        self.get("DATE-OBS").filter(|s| !s.is_empty())
    }

    pub fn exposure_time(&self) -> Option<f64> {
        self.get_f64("EXPTIME").or_else(|| self.get_f64("EXPOSURE"))
    }

    /// Array shape with the slowest axis first (planes, rows, columns).
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().rev().copied().collect()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bitpix.unsigned_abs() as usize / 8
    }

    /// Product of the axis lengths, `None` when it does not fit in `usize`.
    pub fn sample_count(&self) -> Option<usize> {
        if self.axes.is_empty() {
            return Some(0);
        }
        self.axes
            .iter()
            .try_fold(1usize, |acc, &len| acc.checked_mul(len))
    }

    /// Size of the image samples in bytes.
    fn image_byte_size(&self) -> Result<usize> {
        self.sample_count()
            .and_then(|n| n.checked_mul(self.bytes_per_sample()))
            .ok_or_else(|| oversized(&self.axes))
    }

    /// Size of the data unit in bytes, excluding block padding.
    fn data_byte_size(&self) -> Result<usize> {
        let pcount = self
            .get("PCOUNT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let gcount = self
            .get("GCOUNT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1);
        if self.axes.is_empty() && pcount == 0 {
            return Ok(0);
        }
        self.sample_count()
            .and_then(|n| n.checked_add(pcount))
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(self.bytes_per_sample()))
            .ok_or_else(|| oversized(&self.axes))
    }

    fn is_simple(&self) -> bool {
        self.cards
            .first()
            .is_some_and(|c| c.keyword == "SIMPLE" && c.value.as_deref() == Some("T"))
    }

    fn xtension(&self) -> Option<&str> {
        self.get("XTENSION")
    }
}

/// Raw image as read from disk, physical values (BSCALE/BZERO applied).
#[derive(Clone, Debug)]
pub struct RawImage {
    /// Shape in file order, slowest axis first: (H, W) or (C, H, W).
    pub data: ArrayD<f32>,
    pub header: FitsHeader,
    /// Index of the HDU the image was read from (0 = primary).
    pub hdu_index: usize,
}

/// Memory-mapped FITS reader positioned on the first HDU that carries image data.
pub struct FitsReader {
    mmap: Mmap,
    data_offset: usize,
    /// Bytes of image samples, checked against the file length.
    data_len: usize,
    pub header: FitsHeader,
    pub hdu_index: usize,
}

impl FitsReader {
    /// Open a FITS file and locate its image HDU.
    ///
    /// The primary HDU is used when it has data; otherwise the first IMAGE
    /// extension is taken.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len() as usize;
        if len < FITS_BLOCK_SIZE {
            return Err(StarShrinkError::InvalidFits(format!(
                "File too small for a FITS header ({len} bytes)"
            )));
        }
        let mmap = unsafe { Mmap::map(&file)? };

        let mut offset = 0;
        let mut hdu_index = 0;
        while offset < mmap.len() {
            let (cards, data_offset) = parse_header_block(&mmap, offset)?;
            let header = FitsHeader::from_cards(cards)?;
            if hdu_index == 0 && !header.is_simple() {
                return Err(StarShrinkError::InvalidFits(
                    "Missing SIMPLE = T keyword".into(),
                ));
            }

            let data_size = header.data_byte_size()?;
            let data_end = data_offset
                .checked_add(data_size)
                .ok_or_else(|| oversized(&header.axes))?;
            let is_image = hdu_index == 0 || header.xtension() == Some("IMAGE");
            if is_image && header.sample_count() != Some(0) {
                let data_len = header.image_byte_size()?;
                if data_end > mmap.len() || data_len > data_size {
                    return Err(StarShrinkError::InvalidFits(format!(
                        "File truncated: expected at least {data_end} bytes, got {}",
                        mmap.len()
                    )));
                }
                debug!(
                    hdu = hdu_index,
                    bitpix = header.bitpix,
                    axes = ?header.axes,
                    "Located FITS image HDU"
                );
                return Ok(Self {
                    mmap,
                    data_offset,
                    data_len,
                    header,
                    hdu_index,
                });
            }

            offset = padded_size(data_size)
                .and_then(|padded| data_offset.checked_add(padded))
                .ok_or_else(|| oversized(&header.axes))?;
            hdu_index += 1;
        }

        Err(StarShrinkError::InvalidFits("No image data found".into()))
    }

    /// Raw big-endian bytes of the data unit (zero-copy from mmap).
    pub fn data_raw(&self) -> &[u8] {
        &self.mmap[self.data_offset..self.data_offset + self.data_len]
    }

    /// Decode the data unit into physical f32 values.
    pub fn read_image(&self) -> Result<RawImage> {
        let values = decode_samples(self.data_raw(), &self.header);
        let data = ArrayD::from_shape_vec(IxDyn(&self.header.shape()), values).map_err(|e| {
            StarShrinkError::InvalidFits(format!("Cannot shape image data: {e}"))
        })?;
        Ok(RawImage {
            data,
            header: self.header.clone(),
            hdu_index: self.hdu_index,
        })
    }
}

/// Open a FITS file, decode its image and release the file.
pub fn read_fits(path: &Path) -> Result<RawImage> {
    let reader = FitsReader::open(path)?;
    reader.read_image()
}

fn padded_size(size: usize) -> Option<usize> {
    size.div_ceil(FITS_BLOCK_SIZE).checked_mul(FITS_BLOCK_SIZE)
}

fn oversized(axes: &[usize]) -> StarShrinkError {
    StarShrinkError::InvalidFits(format!("Data unit size overflows for axes {axes:?}"))
}

/// Parse header cards starting at `offset` up to END.
/// Returns the cards and the offset of the following data unit.
fn parse_header_block(buf: &[u8], offset: usize) -> Result<(Vec<HeaderCard>, usize)> {
    let mut cards = Vec::new();
    let mut pos = offset;

    loop {
        if pos + FITS_CARD_SIZE > buf.len() {
            return Err(StarShrinkError::InvalidFits("Missing END card".into()));
        }
        let card = &buf[pos..pos + FITS_CARD_SIZE];
        pos += FITS_CARD_SIZE;

        if !card.is_ascii() {
            return Err(StarShrinkError::InvalidFits(
                "Header contains non-ASCII bytes".into(),
            ));
        }
        let keyword = String::from_utf8_lossy(&card[..8]).trim_end().to_string();
        if keyword == "END" {
            break;
        }
        let value = if &card[8..10] == b"= " {
            Some(parse_value(&String::from_utf8_lossy(&card[10..])))
        } else {
            None
        };
        cards.push(HeaderCard { keyword, value });
    }

    // Cards end inside the buffer, so the padded length cannot overflow.
    let header_len = (pos - offset).div_ceil(FITS_BLOCK_SIZE) * FITS_BLOCK_SIZE;
    Ok((cards, offset + header_len))
}

/// Extract the value part of a card: quoted strings are unquoted, anything
/// after a `/` comment separator is dropped.
fn parse_value(field: &str) -> String {
    let trimmed = field.trim_start();
    if let Some(rest) = trimmed.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\'' {
                // '' is an escaped quote inside the string.
                if chars.peek() == Some(&'\'') {
                    out.push('\'');
                    chars.next();
                } else {
                    break;
                }
            } else {
                out.push(ch);
            }
        }
        return out.trim_end().to_string();
    }

    match trimmed.find('/') {
        Some(idx) => trimmed[..idx].trim().to_string(),
        None => trimmed.trim().to_string(),
    }
}

fn parse_float(v: &str) -> Option<f64> {
    v.replace(['D', 'd'], "E").parse::<f64>().ok()
}

fn decode_samples(raw: &[u8], header: &FitsHeader) -> Vec<f32> {
    let n = raw.len() / header.bytes_per_sample();
    let scale = header.bscale;
    let zero = header.bzero;
    let blank = header.blank;
    let physical = |v: i64| -> f32 {
        if blank == Some(v) {
            f32::NAN
        } else {
            (zero + scale * v as f64) as f32
        }
    };

    match header.bitpix {
        8 => raw.iter().map(|&b| physical(b as i64)).collect(),
        16 => {
            let mut buf = vec![0i16; n];
            BigEndian::read_i16_into(raw, &mut buf);
            buf.into_iter().map(|v| physical(v as i64)).collect()
        }
        32 => {
            let mut buf = vec![0i32; n];
            BigEndian::read_i32_into(raw, &mut buf);
            buf.into_iter().map(|v| physical(v as i64)).collect()
        }
        64 => {
            let mut buf = vec![0i64; n];
            BigEndian::read_i64_into(raw, &mut buf);
            buf.into_iter().map(physical).collect()
        }
        -32 => {
            let mut buf = vec![0f32; n];
            BigEndian::read_f32_into(raw, &mut buf);
            buf.into_iter()
                .map(|v| (zero + scale * v as f64) as f32)
                .collect()
        }
        _ => {
            let mut buf = vec![0f64; n];
            BigEndian::read_f64_into(raw, &mut buf);
            buf.into_iter().map(|v| (zero + scale * v) as f32).collect()
        }
    }
}
