use core::fmt;


/// System frame number plus subframe, the 1ms scheduling clock
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SfnSf {
    /// System frame number, from 0 to 1023
    pub frame: u16,
    /// Subframe, from 0 to 9
    pub subframe: u8,
}

impl Default for SfnSf {
    /// Returns the default SfnSf of 0.0
    fn default() -> SfnSf {
        SfnSf { frame: 0, subframe: 0 }
    }
}

pub const SUBFRAMES_PER_FRAME: i32 = 10;
pub const NUM_FRAMES: i32 = 1024;

/// Value of i32 time where it wraps back to 0.
pub const SFN_INT_WRAP: i32 = SUBFRAMES_PER_FRAME * NUM_FRAMES;

/// Difference between two int times, handling wrap-around of the frame number.
pub fn sfn_int_diff(a: i32, b: i32) -> i32 {
    let mut diff = a - b;
    while diff < -SFN_INT_WRAP / 2 { diff += SFN_INT_WRAP; }
    while diff >= SFN_INT_WRAP / 2 { diff -= SFN_INT_WRAP; }
    diff
}

impl SfnSf {
    pub fn new(frame: u16, subframe: u8) -> Self {
        SfnSf { frame, subframe }
    }

    pub fn is_valid(self) -> bool {
        (self.frame as i32) < NUM_FRAMES && (self.subframe as i32) < SUBFRAMES_PER_FRAME
    }

    /// Packed representation used as subframe id: frame in the upper bits, subframe in the lower 4
    pub fn to_u16(self) -> u16 {
        (self.frame << 4) | (self.subframe as u16 & 0x0F)
    }

    pub fn from_u16(packed: u16) -> SfnSf {
        SfnSf { frame: packed >> 4, subframe: (packed & 0x0F) as u8 }
    }

    pub fn to_int(self) -> i32 {
        self.frame as i32 * SUBFRAMES_PER_FRAME + self.subframe as i32
    }

    /// Converts a i32 time into a SfnSf, wrapping the frame number at 1024
    pub fn from_int(time: i32) -> SfnSf {
        let t = time.rem_euclid(SFN_INT_WRAP);
        SfnSf {
            frame: (t / SUBFRAMES_PER_FRAME) as u16,
            subframe: (t % SUBFRAMES_PER_FRAME) as u8,
        }
    }

    /// Add a number of subframes to a SfnSf
    pub fn add_subframes(self, num_sf: i32) -> SfnSf {
        SfnSf::from_int(self.to_int() + num_sf)
    }

    /// Difference between two SfnSf values in subframes
    pub fn diff(self, b: Self) -> i32 {
        sfn_int_diff(self.to_int(), b.to_int())
    }

    /// Age of this SfnSf compared to now
    #[inline(always)]
    pub fn age(self, now: SfnSf) -> i32 {
        now.diff(self)
    }
}

impl fmt::Display for SfnSf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:4}.{}", self.frame, self.subframe)
    }
}

impl fmt::Debug for SfnSf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:4}.{}", self.frame, self.subframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_subframes_and_diff() {
        let initial_time = SfnSf::default();

        let mut time = initial_time;
        // Enough iterations for the frame number to wrap several times
        let iterations = 10000;
        let increment = 1237;
        for _ in 0..iterations {
            let time2 = time.add_subframes(increment);
            assert_eq!(time2.diff(time), increment);
            assert_eq!(time.diff(time2), -increment);
            time = time2;
        }

        for _ in 0..iterations {
            let time2 = time.add_subframes(-increment);
            assert_eq!(time2.diff(time), -increment);
            time = time2;
        }

        assert_eq!(time, initial_time);
    }

    #[test]
    fn test_from_int() {
        assert_eq!(SfnSf::from_int(0), SfnSf { frame: 0, subframe: 0 });
        assert_eq!(SfnSf::from_int(9), SfnSf { frame: 0, subframe: 9 });
        assert_eq!(SfnSf::from_int(10), SfnSf { frame: 1, subframe: 0 });
        assert_eq!(SfnSf::from_int(-1), SfnSf { frame: 1023, subframe: 9 });
        assert_eq!(SfnSf::from_int(SFN_INT_WRAP + 3), SfnSf { frame: 0, subframe: 3 });
    }

    #[test]
    fn test_packed_subframe_id() {
        let t = SfnSf::new(517, 6);
        assert_eq!(t.to_u16(), (517 << 4) | 6);
        assert_eq!(SfnSf::from_u16(t.to_u16()), t);
        assert!(t.is_valid());
        assert!(!SfnSf::new(1024, 0).is_valid());
    }
}
