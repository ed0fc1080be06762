/// Upper bound in bytes of each BSR buffer size level, 36.321 table 6.1.3.1-1
const BUFFER_SIZE_LEVEL_BSR: [u32; 64] = [
    0, 10, 12, 14, 17, 19, 22, 26, 31, 36, 42, 49, 57, 67, 78, 91, 107, 125, 146, 171, 200, 234,
    274, 321, 376, 440, 515, 603, 706, 826, 967, 1132, 1326, 1552, 1817, 2127, 2490, 2915, 3413,
    3995, 4667, 5476, 6411, 7505, 8787, 10287, 12043, 14099, 16507, 19325, 22624, 26487, 31009,
    36304, 42502, 49759, 58255, 68201, 79846, 93479, 109439, 128125, 150000, 150000,
];

/// Buffer size in bytes for a 6-bit BSR level index. Indices past the table saturate.
pub fn bsr_id_to_buffer_size(bsr_id: u8) -> u32 {
    BUFFER_SIZE_LEVEL_BSR[(bsr_id as usize).min(BUFFER_SIZE_LEVEL_BSR.len() - 1)]
}

/// Smallest BSR level index whose buffer size covers `bytes`
pub fn buffer_size_to_bsr_id(bytes: u32) -> u8 {
    BUFFER_SIZE_LEVEL_BSR
        .iter()
        .position(|&level| level >= bytes)
        .unwrap_or(BUFFER_SIZE_LEVEL_BSR.len() - 1) as u8
}

/// Signed 16 bit fixed point with 3 fractional bits (S11.3) to f64
pub fn fp_s11dot3_to_f64(val: u16) -> f64 {
    (val as i16) as f64 / 8.0
}

/// f64 to S11.3 fixed point, saturating at the representable range
pub fn f64_to_fp_s11dot3(val: f64) -> u16 {
    let scaled = (val * 8.0).round().clamp(i16::MIN as f64, i16::MAX as f64);
    (scaled as i16) as u16
}
