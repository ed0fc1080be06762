//! Adaptive modulation and coding: CQI, SINR, MCS and transport block size mappings
//!
//! Tables follow 36.213. Transport block sizes come from table 7.1.7.2.1-1, PRB counts
//! above 110 are clamped to the last column.

use crate::tbs_table::TBS_TABLE;

/// Highest CQI index
pub const MAX_CQI: u8 = 15;
/// Highest MCS index
pub const MAX_MCS: u8 = 28;

/// Spectral efficiency (bits/s/Hz) per CQI index, 36.213 table 7.2.3-1
const SPECTRAL_EFFICIENCY_FOR_CQI: [f64; 16] = [
    0.0, 0.15, 0.23, 0.38, 0.6, 0.88, 1.18, 1.48, 1.91, 2.41, 2.73, 3.32, 3.9, 4.52, 5.12, 5.55,
];

/// Spectral efficiency (bits/s/Hz) per MCS index
const SPECTRAL_EFFICIENCY_FOR_MCS: [f64; 29] = [
    0.15, 0.19, 0.23, 0.31, 0.38, 0.49, 0.6, 0.74, 0.88, 1.03, 1.18, 1.33, 1.48, 1.7, 1.91, 2.16,
    2.41, 2.57, 2.73, 3.03, 3.32, 3.61, 3.9, 4.21, 4.52, 4.82, 5.12, 5.33, 5.55,
];

/// MCS to TBS index, 36.213 table 7.1.7.1-1
const MCS_TO_ITBS_DL: [u8; 29] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 10, 11, 12, 13, 14, 15, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
    25, 26,
];

/// MCS to TBS index, 36.213 table 8.6.1-1
const MCS_TO_ITBS_UL: [u8; 29] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 23,
    24, 25, 26,
];

/// Target bit error rate used when mapping SINR to spectral efficiency
const AMC_BER: f64 = 0.00005;

/// Spectral efficiency of a CQI index. Out of range indices are treated as CQI 0.
pub fn spectral_efficiency_for_cqi(cqi: u8) -> f64 {
    SPECTRAL_EFFICIENCY_FOR_CQI.get(cqi as usize).copied().unwrap_or(0.0)
}

/// Highest MCS whose spectral efficiency does not exceed the one of the CQI
pub fn mcs_from_cqi(cqi: u8) -> u8 {
    let efficiency = spectral_efficiency_for_cqi(cqi);
    let mut mcs = 0;
    while mcs < MAX_MCS && SPECTRAL_EFFICIENCY_FOR_MCS[mcs as usize + 1] <= efficiency {
        mcs += 1;
    }
    mcs
}

/// Highest CQI whose spectral efficiency stays below the given one. 0 means out of range.
pub fn cqi_from_spectral_efficiency(s: f64) -> u8 {
    let mut cqi = 0;
    while cqi < MAX_CQI && SPECTRAL_EFFICIENCY_FOR_CQI[cqi as usize + 1] < s {
        cqi += 1;
    }
    cqi
}

/// Maps an SINR in dB to a CQI index through the Shannon bound with BER gap
pub fn cqi_from_sinr(sinr_db: f64) -> u8 {
    let sinr = 10f64.powf(sinr_db / 10.0);
    let gamma = -(5.0 * AMC_BER).ln() / 1.5;
    let s = (1.0 + sinr / gamma).log2();
    cqi_from_spectral_efficiency(s)
}

fn tbs_from_itbs(itbs: u8, nprb: usize) -> u32 {
    if nprb == 0 {
        return 0;
    }
    let row = &TBS_TABLE[(itbs as usize).min(TBS_TABLE.len() - 1)];
    row[nprb.min(row.len()) - 1]
}

/// Downlink transport block size in bits for an MCS over `nprb` resource blocks
pub fn dl_tbs_bits(mcs: u8, nprb: usize) -> u32 {
    let itbs = MCS_TO_ITBS_DL[mcs.min(MAX_MCS) as usize];
    tbs_from_itbs(itbs, nprb)
}

/// Uplink transport block size in bits for an MCS over `nprb` resource blocks
pub fn ul_tbs_bits(mcs: u8, nprb: usize) -> u32 {
    let itbs = MCS_TO_ITBS_UL[mcs.min(MAX_MCS) as usize];
    tbs_from_itbs(itbs, nprb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcs_from_cqi() {
        assert_eq!(mcs_from_cqi(0), 0);
        assert_eq!(mcs_from_cqi(1), 0);
        assert_eq!(mcs_from_cqi(7), 12);
        assert_eq!(mcs_from_cqi(15), 28);
    }

    #[test]
    fn test_cqi_from_sinr_is_monotonic() {
        assert_eq!(cqi_from_sinr(-20.0), 0);
        assert_eq!(cqi_from_sinr(40.0), 15);
        let mut last = 0;
        for db in -20..40 {
            let cqi = cqi_from_sinr(db as f64);
            assert!(cqi >= last, "cqi dropped at {} dB", db);
            last = cqi;
        }
    }

    #[test]
    fn test_tbs_table_entries() {
        assert_eq!(dl_tbs_bits(0, 0), 0);
        assert_eq!(dl_tbs_bits(0, 1), 16);
        assert_eq!(dl_tbs_bits(0, 100), 2792);
        assert_eq!(dl_tbs_bits(4, 50), 3624);
        assert_eq!(dl_tbs_bits(9, 25), 4008);
        assert_eq!(dl_tbs_bits(11, 25), 4392);
        assert_eq!(dl_tbs_bits(28, 6), 4392);
        assert_eq!(dl_tbs_bits(28, 15), 11064);
        assert_eq!(dl_tbs_bits(28, 25), 18336);
        assert_eq!(dl_tbs_bits(28, 50), 36696);
        assert_eq!(dl_tbs_bits(28, 100), 75376);
        assert_eq!(ul_tbs_bits(0, 3), 56);
        // More PRBs than the table has use the last column
        assert_eq!(dl_tbs_bits(28, 120), dl_tbs_bits(28, 110));
        // MCS 10 and 9 share TBS index 9 in DL but not in UL
        assert_eq!(dl_tbs_bits(9, 10), dl_tbs_bits(10, 10));
        assert!(ul_tbs_bits(10, 10) > ul_tbs_bits(9, 10));
    }

    /// Turbo interleaver sizes of 36.212 table 5.1.3-3
    fn is_interleaver_size(k: u32) -> bool {
        match k {
            40..=512 => k % 8 == 0,
            513..=1024 => k % 16 == 0,
            1025..=2048 => k % 32 == 0,
            2049..=6144 => k % 64 == 0,
            _ => false,
        }
    }

    #[test]
    fn test_tbs_segments_without_filler() {
        for (itbs, row) in TBS_TABLE.iter().enumerate() {
            for (n, &tbs) in row.iter().enumerate() {
                let b = tbs + 24;
                let ok = if b <= 6144 {
                    is_interleaver_size(b)
                } else {
                    let blocks = b.div_ceil(6120);
                    let total = b + 24 * blocks;
                    total % blocks == 0 && is_interleaver_size(total / blocks)
                };
                assert!(ok, "tbs {} at itbs {} nprb {}", tbs, itbs, n + 1);
            }
        }
    }

    #[test]
    fn test_tbs_grows_with_itbs() {
        for n in 0..110 {
            for itbs in 1..TBS_TABLE.len() {
                assert!(TBS_TABLE[itbs][n] >= TBS_TABLE[itbs - 1][n]);
            }
        }
    }

    #[test]
    fn test_tbs_grows_with_prbs() {
        for mcs in 0..=MAX_MCS {
            let mut last = 0;
            for nprb in 1..=110 {
                let tbs = dl_tbs_bits(mcs, nprb);
                assert!(tbs >= last);
                assert_eq!(tbs % 8, 0);
                last = tbs;
            }
        }
    }
}
