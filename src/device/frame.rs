use std::fmt;

pub const FRAME_LEN: usize = 8;

const FRAME_TERMINATOR: u8 = 0x0d;

const SHUFFLE: [usize; FRAME_LEN] = [2, 4, 0, 7, 1, 6, 5, 3];

const KEY: [u8; FRAME_LEN] = [0xc4, 0xc6, 0xc0, 0x92, 0x40, 0x23, 0xdc, 0x96];

const CSTATE: [u8; FRAME_LEN] = *b"Htemp99e";

const CTMP: [u8; FRAME_LEN] = nibble_swap(CSTATE);

/// 8 bytes exactly as read from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame(pub [u8; FRAME_LEN]);

/// Plaintext frame: `[op, value_hi, value_lo, checksum, 0x0d, _, _, _]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptedFrame(pub [u8; FRAME_LEN]);

impl RawFrame {
    pub fn decrypt(self) -> DecryptedFrame {
        decrypt(self)
    }
}

impl DecryptedFrame {
    pub fn operation(&self) -> u8 {
        self.0[0]
    }

    pub fn value(&self) -> u16 {
        u16::from_be_bytes([self.0[1], self.0[2]])
    }

    pub fn is_valid(&self) -> bool {
        is_valid(self)
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Display for DecryptedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

const fn nibble_swap(state: [u8; FRAME_LEN]) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    let mut i = 0;
    while i < FRAME_LEN {
        out[i] = state[i].rotate_left(4);
        i += 1;
    }
    out
}

/// Reverses the sensor's frame obfuscation.
///
/// Total over any input: garbage in yields garbage out, which [`is_valid`]
/// is expected to reject.
pub fn decrypt(raw: RawFrame) -> DecryptedFrame {
    let mut phase1 = [0u8; FRAME_LEN];
    for (i, &dst) in SHUFFLE.iter().enumerate() {
        phase1[dst] = raw.0[i];
    }

    let mut phase2 = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        phase2[i] = phase1[i] ^ KEY[i];
    }

    let mut out = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        let prev = phase2[(i + FRAME_LEN - 1) % FRAME_LEN];
        let phase3 = (phase2[i] >> 3) | (prev << 5);
        out[i] = phase3.wrapping_sub(CTMP[i]);
    }

    DecryptedFrame(out)
}

/// Checks the terminator byte and the checksum trailer.
pub fn is_valid(frame: &DecryptedFrame) -> bool {
    let b = &frame.0;
    b[4] == FRAME_TERMINATOR && b[3] == b[0].wrapping_add(b[1]).wrapping_add(b[2])
}

/// Forward cipher, used to build device-shaped frames in tests.
#[cfg(test)]
pub(crate) fn encrypt(plain: DecryptedFrame) -> RawFrame {
    let mut phase3 = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        phase3[i] = plain.0[i].wrapping_add(CTMP[i]);
    }

    let mut phase1 = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        let next = phase3[(i + 1) % FRAME_LEN];
        phase1[i] = ((phase3[i] << 3) | (next >> 5)) ^ KEY[i];
    }

    let mut raw = [0u8; FRAME_LEN];
    for (i, &src) in SHUFFLE.iter().enumerate() {
        raw[i] = phase1[src];
    }
    RawFrame(raw)
}

/// Builds a well-formed plaintext frame for `operation` and `value`.
#[cfg(test)]
pub(crate) fn plain_frame(operation: u8, value: u16) -> DecryptedFrame {
    let [hi, lo] = value.to_be_bytes();
    let checksum = operation.wrapping_add(hi).wrapping_add(lo);
    DecryptedFrame([operation, hi, lo, checksum, FRAME_TERMINATOR, 0, 0, 0])
}
