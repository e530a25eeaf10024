use std::str::FromStr;

/// PNG scanline filter, applied uniformly to every row of a frame.
///
/// `None` is the default; it keeps the output byte-for-byte stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl Default for Filter {
    fn default() -> Self {
        Filter::None
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Filter::None),
            "sub" => Ok(Filter::Sub),
            "up" => Ok(Filter::Up),
            "average" | "avg" => Ok(Filter::Average),
            "paeth" => Ok(Filter::Paeth),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Builds the filtered scanline stream for 8-bit indexed rows: every row is
/// prefixed with the filter type byte.
pub fn serialize<'a, I>(rows: I, width: usize, filter: Filter) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut data = Vec::new();
    let zeros = vec![0u8; width];
    let mut previous: &[u8] = &zeros;
    for row in rows {
        data.push(filter as u8);
        let start = data.len();
        data.extend_from_slice(row);
        apply(filter, previous, &mut data[start..]);
        previous = row;
    }
    data
}

// One byte per pixel, so the left neighbour is always at `i - 1`.
fn apply(filter: Filter, previous: &[u8], current: &mut [u8]) {
    let len = current.len();
    match filter {
        Filter::None => (),
        Filter::Sub => {
            for i in (1..len).rev() {
                current[i] = current[i].wrapping_sub(current[i - 1]);
            }
        }
        Filter::Up => {
            for i in 0..len {
                current[i] = current[i].wrapping_sub(previous[i]);
            }
        }
        Filter::Average => {
            for i in (0..len).rev() {
                let left = if i > 0 { current[i - 1] as u16 } else { 0 };
                let average = ((left + previous[i] as u16) / 2) as u8;
                current[i] = current[i].wrapping_sub(average);
            }
        }
        Filter::Paeth => {
            for i in (0..len).rev() {
                let (left, upper_left) = if i > 0 {
                    (current[i - 1], previous[i - 1])
                } else {
                    (0, 0)
                };
                current[i] = current[i].wrapping_sub(paeth(left, previous[i], upper_left));
            }
        }
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let ia = a as i16;
    let ib = b as i16;
    let ic = c as i16;

    let p = ia + ib - ic;

    let pa = (p - ia).abs();
    let pb = (p - ib).abs();
    let pc = (p - ic).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
