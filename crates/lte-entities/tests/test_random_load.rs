mod common;

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lte_config::SharedConfig;
use lte_core::conversions::f64_to_fp_s11dot3;
use lte_core::{HARQ_PERIOD, PolicyKind, SfnSf, TxMode, UlCqiFilter, debug};
use lte_entities::FfMacScheduler;
use lte_saps::fields::build_data::BuildDataListElement;
use lte_saps::fields::cqi::{CqiListElement, UlCqi, UlCqiType};
use lte_saps::fields::dci::UlDci;
use lte_saps::fields::harq_info::{DlInfoListElement, HarqStatus, ReceptionStatus, UlInfoListElement};
use lte_saps::fields::lc_config::LogicalChannelConfig;
use lte_saps::fields::mac_ce::MacCeListElement;
use lte_saps::sched::SchedDlRlcBufferReq;
use common::default_test_config;

const NUM_UES: u16 = 6;
const NUM_TTIS: usize = 300;

fn assert_dl_disjoint(data: &[BuildDataListElement], rbg_num: usize) {
    let mut used = 0u32;
    for entry in data {
        let bitmap = entry.dci.rb_bitmap;
        assert_eq!(bitmap >> rbg_num, 0, "rnti {} beyond the band: {:b}", entry.rnti, bitmap);
        assert_eq!(used & bitmap, 0, "rnti {} overlaps: {:b} vs {:b}", entry.rnti, used, bitmap);
        used |= bitmap;
    }
}

fn assert_ul_disjoint(dcis: &[UlDci], num_rbs: usize) {
    let mut used = vec![false; num_rbs];
    for dci in dcis {
        for rb in dci.rb_range() {
            assert!(rb < num_rbs, "rb {} out of band", rb);
            assert!(!used[rb], "rb {} granted twice", rb);
            used[rb] = true;
        }
    }
}

fn run_random_load(policy: PolicyKind, seed: u64) {
    debug::setup_logging_verbose();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut cfg = default_test_config();
    cfg.policy = policy;
    cfg.ul_cqi_filter = UlCqiFilter::All;
    let mut sched = FfMacScheduler::new(SharedConfig::from_config(cfg));

    for rnti in 1..=NUM_UES {
        let tx_mode = if rng.random_bool(0.3) { TxMode::SpatialMuxOpenLoop } else { TxMode::Siso };
        sched.configure_ue(rnti, tx_mode);
        sched.configure_logical_channel(rnti, LogicalChannelConfig::new(1, 0, 0)).unwrap();
        let mut data_lc = LogicalChannelConfig::new(3, 0, 0);
        data_lc.qci = rng.random_range(1..=9);
        sched.configure_logical_channel(rnti, data_lc).unwrap();
    }

    let mut sfn_sf = SfnSf::new(1000, 0);
    let mut dl_feedback: Vec<DlInfoListElement> = vec![];
    let mut ul_history: VecDeque<Vec<UlDci>> = VecDeque::new();

    for _ in 0..NUM_TTIS {
        // Fresh reports for a random subset of UEs
        for rnti in 1..=NUM_UES {
            if rng.random_bool(0.2) {
                let lcid = if rng.random_bool(0.2) { 1 } else { 3 };
                sched.report_dl_rlc_buffer(SchedDlRlcBufferReq {
                    rnti,
                    lcid,
                    tx_queue_size: rng.random_range(0..20_000),
                    retx_queue_size: rng.random_range(0..200),
                    status_pdu_size: rng.random_range(0..4),
                });
            }
            if rng.random_bool(0.2) {
                sched.report_dl_cqi(vec![CqiListElement::wideband(rnti, rng.random_range(0..=15))]);
            }
            if rng.random_bool(0.1) {
                let sb = (0..12).map(|_| vec![rng.random_range(0..=15), rng.random_range(0..=15)]).collect();
                sched.report_dl_cqi(vec![CqiListElement::subband(rnti, sb)]);
            }
            if rng.random_bool(0.2) {
                sched.report_ul_mac_ce(vec![MacCeListElement::bsr(rnti, [rng.random_range(0..64), 0, 0, 0])]);
            }
            if rng.random_bool(0.1) {
                let sinr = (0..25).map(|_| f64_to_fp_s11dot3(rng.random_range(-10.0..30.0))).collect();
                sched.report_ul_cqi(sfn_sf, UlCqi { sinr, cqi_type: UlCqiType::Srs { rnti } });
            }
        }

        let dl = sched.trigger_dl(sfn_sf, std::mem::take(&mut dl_feedback)).unwrap();
        assert_dl_disjoint(&dl.build_data_list, 12);
        for entry in &dl.build_data_list {
            let harq_status = (0..entry.dci.num_layers())
                .map(|_| if rng.random_bool(0.3) { HarqStatus::Nack } else { HarqStatus::Ack })
                .collect();
            dl_feedback.push(DlInfoListElement { rnti: entry.rnti, harq_process_id: entry.dci.harq_process, harq_status });
        }

        // UL feedback refers to the grants of HARQ_PERIOD triggers back
        let ul_feedback = if ul_history.len() == HARQ_PERIOD as usize {
            ul_history
                .pop_front()
                .unwrap_or_default()
                .iter()
                .map(|dci| UlInfoListElement {
                    rnti: dci.rnti,
                    reception_status: if rng.random_bool(0.3) { ReceptionStatus::NotOk } else { ReceptionStatus::Ok },
                })
                .collect()
        } else {
            vec![]
        };
        let ul = sched.trigger_ul(sfn_sf, ul_feedback).unwrap();
        assert_ul_disjoint(&ul.dci_list, 25);

        // PUSCH measurement of this subframe's grants
        if !ul.dci_list.is_empty() && rng.random_bool(0.5) {
            let sinr = (0..25).map(|_| f64_to_fp_s11dot3(rng.random_range(-5.0..25.0))).collect();
            sched.report_ul_cqi(sfn_sf, UlCqi { sinr, cqi_type: UlCqiType::Pusch });
        }
        ul_history.push_back(ul.dci_list);

        sfn_sf = sfn_sf.add_subframes(1);
    }
}

#[test]
fn test_random_load_rr() {
    run_random_load(PolicyKind::RoundRobin, 1);
}

#[test]
fn test_random_load_pf() {
    run_random_load(PolicyKind::ProportionalFair, 2);
}

#[test]
fn test_random_load_mt() {
    run_random_load(PolicyKind::MaxThroughput, 3);
}

#[test]
fn test_random_load_priority() {
    run_random_load(PolicyKind::Priority, 4);
}
