use std::fmt;

pub(crate) const SIGNATURE: &[u8; 3] = b"GIF";
pub(crate) const TRAILER: u8 = 0x3b;
pub(crate) const BLOCK_TERMINATOR: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Version {
    V87a,
    V89a,
}

impl Version {
    pub(crate) fn from_bytes(bytes: &[u8; 3]) -> Option<Self> {
        match bytes {
            b"87a" => Some(Self::V87a),
            b"89a" => Some(Self::V89a),
            _ => None,
        }
    }
}

pub(crate) struct LogicalScreenDescriptor {
    pub(crate) logical_screen_width: u16,
    pub(crate) logical_screen_height: u16,
    pub(crate) packed_fields: u8,
    pub(crate) background_color_index: u8,
    pub(crate) pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
    pub(crate) const SIZE: usize = 7;

    // 1 bit (MSB)
    pub(crate) fn global_color_table_flag(&self) -> bool {
        self.packed_fields >> 7 == 1
    }

    // 3 bits, stored as bits - 1
    pub(crate) fn color_resolution(&self) -> u8 {
        ((self.packed_fields >> 4) & 0b111) + 1
    }

    // 1 bit
    pub(crate) fn sort_flag(&self) -> bool {
        (self.packed_fields >> 3) & 1 == 1
    }

    // 3 bits (LSB)
    pub(crate) fn global_color_table_len(&self) -> usize {
        color_table_len(self.packed_fields)
    }
}

impl fmt::Debug for LogicalScreenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalScreenDescriptor")
            .field("logical_screen_width", &self.logical_screen_width)
            .field("logical_screen_height", &self.logical_screen_height)
            .field("global_color_table_flag", &self.global_color_table_flag())
            .field("color_resolution", &self.color_resolution())
            .field("sort_flag", &self.sort_flag())
            .field("global_color_table_len", &self.global_color_table_len())
            .field("background_color_index", &self.background_color_index)
            .field("pixel_aspect_ratio", &self.pixel_aspect_ratio)
            .finish()
    }
}

pub(crate) struct ImageDescriptor {
    pub(crate) image_left_position: u16,
    pub(crate) image_top_position: u16,
    pub(crate) image_width: u16,
    pub(crate) image_height: u16,
    pub(crate) packed_fields: u8,
}

impl ImageDescriptor {
    pub(crate) const SEPARATOR: u8 = 0x2c;
    pub(crate) const SIZE: usize = 9;

    pub(crate) fn local_color_table_flag(&self) -> bool {
        self.packed_fields >> 7 == 1
    }

    pub(crate) fn interlace_flag(&self) -> bool {
        (self.packed_fields >> 6) & 1 == 1
    }

    pub(crate) fn sort_flag(&self) -> bool {
        (self.packed_fields >> 5) & 1 == 1
    }

    pub(crate) fn local_color_table_len(&self) -> usize {
        color_table_len(self.packed_fields)
    }

    pub(crate) fn pixel_count(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }
}

impl fmt::Debug for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDescriptor")
            .field("image_left_position", &self.image_left_position)
            .field("image_top_position", &self.image_top_position)
            .field("image_width", &self.image_width)
            .field("image_height", &self.image_height)
            .field("local_color_table_flag", &self.local_color_table_flag())
            .field("interlace_flag", &self.interlace_flag())
            .field("sort_flag", &self.sort_flag())
            .field("local_color_table_len", &self.local_color_table_len())
            .finish()
    }
}

pub(crate) const EXTENSION_INTRODUCER: u8 = 0x21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtensionLabel {
    GraphicControl,
    Comment,
    PlainText,
    Application,
}

impl ExtensionLabel {
    pub(crate) fn from_u8(label: u8) -> Option<Self> {
        match label {
            GraphicControlExtension::LABEL => Some(Self::GraphicControl),
            0xfe => Some(Self::Comment),
            0x01 => Some(Self::PlainText),
            0xff => Some(Self::Application),
            _ => None,
        }
    }
}

impl From<ExtensionLabel> for &'static str {
    fn from(x: ExtensionLabel) -> &'static str {
        match x {
            ExtensionLabel::GraphicControl => "graphic control",
            ExtensionLabel::Comment => "comment",
            ExtensionLabel::PlainText => "plain text",
            ExtensionLabel::Application => "application",
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct GraphicControlExtension {
    pub(crate) packed_fields: u8,
    pub(crate) delay_time: u16,
    pub(crate) transparent_color_index: u8,
}

impl GraphicControlExtension {
    pub(crate) const LABEL: u8 = 0xf9;
    pub(crate) const BLOCK_SIZE: u8 = 4;

    // 3 bits
    pub(crate) fn disposal_method(&self) -> u8 {
        (self.packed_fields >> 2) & 0b111
    }

    // 1 bit
    pub(crate) fn user_input_flag(&self) -> bool {
        (self.packed_fields >> 1) & 1 == 1
    }

    // 1 bit (LSB)
    pub(crate) fn transparent_color_flag(&self) -> bool {
        self.packed_fields & 1 == 1
    }

    pub(crate) fn transparent(&self) -> Option<u8> {
        if self.transparent_color_flag() {
            Some(self.transparent_color_index)
        } else {
            None
        }
    }
}

impl fmt::Debug for GraphicControlExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicControlExtension")
            .field("disposal_method", &self.disposal_method())
            .field("user_input_flag", &self.user_input_flag())
            .field("transparent_color_flag", &self.transparent_color_flag())
            .field("delay_time", &self.delay_time)
            .field("transparent_color_index", &self.transparent_color_index)
            .finish()
    }
}

pub(crate) struct ApplicationExtension {
    pub(crate) identifier: [u8; 8],
    pub(crate) authentication_code: [u8; 3],
}

impl ApplicationExtension {
    pub(crate) const BLOCK_SIZE: u8 = 11;
    const LOOPING_SUB_BLOCK_ID: u8 = 0x01;

    /// Identifies the NETSCAPE2.0 (and equivalent ANIMEXTS1.0) looping block.
    pub(crate) fn is_looping(&self) -> bool {
        matches!(
            (&self.identifier, &self.authentication_code),
            (b"NETSCAPE", b"2.0") | (b"ANIMEXTS", b"1.0")
        )
    }

    /// Loop count stored in a looping sub-block (`01 lo hi`).
    pub(crate) fn loop_count(sub_block: &[u8]) -> Option<u16> {
        match sub_block {
            [Self::LOOPING_SUB_BLOCK_ID, lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    }
}

impl fmt::Debug for ApplicationExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationExtension")
            .field("identifier", &String::from_utf8_lossy(&self.identifier))
            .field(
                "authentication_code",
                &String::from_utf8_lossy(&self.authentication_code),
            )
            .finish()
    }
}

fn color_table_len(packed_fields: u8) -> usize {
    2usize.pow((packed_fields & 0b111) as u32 + 1)
}
