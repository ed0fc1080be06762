use lte_core::Rnti;

/// DL CQI reporting modes, 36.213 clause 7.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CqiType {
    /// Periodic, wideband, no PMI
    P10,
    P11,
    P20,
    P21,
    A12,
    A22,
    A20,
    /// Aperiodic, higher layer configured subband
    A30,
    A31,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HigherLayerSelected {
    pub sb_pmi: u8,
    /// CQI per layer for this subband
    pub sb_cqi: Vec<u8>,
}

/// Subband measurement, one entry per RBG
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SbMeasResult {
    pub higher_layer_selected: Vec<HigherLayerSelected>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqiListElement {
    pub rnti: Rnti,
    pub cqi_type: CqiType,
    /// Wideband CQI per layer
    pub wb_cqi: Vec<u8>,
    pub sb_measurement: SbMeasResult,
}

impl CqiListElement {
    pub fn wideband(rnti: Rnti, cqi: u8) -> Self {
        CqiListElement {
            rnti,
            cqi_type: CqiType::P10,
            wb_cqi: vec![cqi],
            sb_measurement: SbMeasResult::default(),
        }
    }

    /// Subband report where `sb_cqi[rbg][layer]` holds the CQI values
    pub fn subband(rnti: Rnti, sb_cqi: Vec<Vec<u8>>) -> Self {
        let higher_layer_selected = sb_cqi
            .into_iter()
            .map(|sb_cqi| HigherLayerSelected { sb_pmi: 0, sb_cqi })
            .collect();
        CqiListElement {
            rnti,
            cqi_type: CqiType::A30,
            wb_cqi: vec![],
            sb_measurement: SbMeasResult { higher_layer_selected },
        }
    }
}

/// Source of an UL SINR report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UlCqiType {
    /// Sounding reference signal, covers the whole band for one UE
    Srs { rnti: Rnti },
    /// Measured on PUSCH, covers the RBs allocated in the reported subframe
    Pusch,
    Pucch1,
    Pucch2,
    Prach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlCqi {
    /// SINR per RB in S11.3 fixed point
    pub sinr: Vec<u16>,
    pub cqi_type: UlCqiType,
}
