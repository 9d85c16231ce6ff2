use crate::core::assembly::{self, AssembledGroup};
use crate::core::coherence::CoherenceMatcher;
use crate::core::{dedup, normalize};
use crate::io::list_file::{self, ListKind};
use crate::types::{
    CoherenceJob, PlanResult, ProcessingJob, ProductType, RunContext, SceneRecord,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The three ordered output lists of one planning run, in ascending
/// acquisition-time order. Coherence lists are empty for GRD runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkPlan {
    pub jobs: Vec<ProcessingJob>,
    pub coh_6d: Vec<CoherenceJob>,
    pub coh_12d: Vec<CoherenceJob>,
}

impl WorkPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.coh_6d.is_empty() && self.coh_12d.is_empty()
    }
}

/// Generates the work plan for the given tile identifiers and writes the
/// list files under the context's result path. Empty input produces an empty
/// plan and writes nothing.
pub fn generate_file_list(tiles: &[String], ctx: &RunContext) -> PlanResult<WorkPlan> {
    let plan = generate_plan(tiles, ctx);
    if !tiles.is_empty() {
        write_plan(&plan, ctx)?;
    }
    Ok(plan)
}

/// Builds the plan without touching the output boundary.
///
/// Pipeline: normalize -> dedup -> (optional GRD redundancy prune) ->
/// slice-assembly grouping -> per-job coherence matching. Collection happens
/// in discovery order (most recent acquisition first); the finished lists
/// are flipped once into ascending time order.
pub fn generate_plan(tiles: &[String], ctx: &RunContext) -> WorkPlan {
    if tiles.is_empty() {
        return WorkPlan::default();
    }

    let records = normalize::normalize_all(tiles);
    let records = dedup::dedup_records(records);
    let records = if !ctx.slice_mode && ctx.product_type == ProductType::Grd {
        assembly::prune_redundant(records)
    } else {
        records
    };

    let slice_required = ctx.slice_mode && assembly::requires_slice_assembly(&records);
    let matcher = CoherenceMatcher::new(&records, ctx.with_scene_id);

    let mut jobs: Vec<ProcessingJob>;
    let mut coh_6d: Vec<CoherenceJob> = Vec::new();
    let mut coh_12d: Vec<CoherenceJob> = Vec::new();

    if slice_required {
        log::info!("slice assembling required");
        let groups = assembly::assemble_groups(&records);
        jobs = groups.iter().map(|g| job_from_group(g, ctx)).collect();

        if ctx.product_type == ProductType::Slc {
            let matches: Vec<_> = groups
                .par_iter()
                .map(|group| {
                    (
                        matcher.match_assembled(group, 6),
                        matcher.match_assembled(group, 12),
                    )
                })
                .collect();
            for (m6, m12) in matches {
                coh_6d.extend(m6);
                coh_12d.extend(m12);
            }
        }
    } else {
        log::info!("no slice assembling required");
        jobs = records
            .iter()
            .map(|record| single_job(record, ctx))
            .collect();

        if ctx.product_type == ProductType::Slc {
            let matches: Vec<_> = records
                .par_iter()
                .map(|record| {
                    (
                        matcher.match_single(record, 6),
                        matcher.match_single(record, 12),
                    )
                })
                .collect();
            for (m6, m12) in matches {
                coh_6d.extend(m6);
                coh_12d.extend(m12);
            }
        }
    }

    // discovery order is descending by acquisition time; the external
    // contract wants ascending
    jobs.reverse();
    coh_6d.reverse();
    coh_12d.reverse();

    WorkPlan {
        jobs,
        coh_6d,
        coh_12d,
    }
}

fn single_job(record: &SceneRecord, ctx: &RunContext) -> ProcessingJob {
    ProcessingJob {
        output_name: job_output_name(record, std::slice::from_ref(record), ctx),
        members: vec![record.clone()],
    }
}

fn job_from_group(group: &AssembledGroup, ctx: &RunContext) -> ProcessingJob {
    let members = group.job_members();
    ProcessingJob {
        output_name: job_output_name(&group.anchor, &members, ctx),
        members,
    }
}

/// Primary output name: anchor date, platform, polarization, relative orbit,
/// pass direction, optional unique-id suffix per member, product tag
fn job_output_name(anchor: &SceneRecord, members: &[SceneRecord], ctx: &RunContext) -> String {
    let uid: String = if ctx.with_scene_id {
        members
            .iter()
            .map(|m| format!("_{}", m.unique_id))
            .collect()
    } else {
        String::new()
    };
    format!(
        "{}_{}_{}_{}_{}{}_{}",
        anchor.date_token(),
        anchor.platform,
        anchor.polarization,
        anchor.relative_orbit,
        anchor.orbit_direction.name_token(),
        uid,
        ctx.product_type.output_product()
    )
}

/// Writes the plan's list files, overwriting any previous artifacts at the
/// same paths. GRD runs produce the primary list only.
pub fn write_plan(plan: &WorkPlan, ctx: &RunContext) -> PlanResult<()> {
    let job_rows: Vec<Vec<String>> = plan
        .jobs
        .iter()
        .map(|job| vec![job.member_paths(), job.output_name.clone()])
        .collect();
    let primary = ctx
        .result_path
        .join(list_file::list_file_name(ctx, ListKind::Primary));
    list_file::write_list(&primary, &job_rows)?;

    if ctx.product_type == ProductType::Slc {
        for (jobs, kind) in [
            (&plan.coh_6d, ListKind::Coherence6d),
            (&plan.coh_12d, ListKind::Coherence12d),
        ] {
            let rows: Vec<Vec<String>> = jobs
                .iter()
                .map(|job| {
                    vec![
                        job.base_paths(),
                        job.partner_paths(),
                        job.output_name.clone(),
                    ]
                })
                .collect();
            let path = ctx.result_path.join(list_file::list_file_name(ctx, kind));
            list_file::write_list(&path, &rows)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn context(product_type: ProductType, result_path: &std::path::Path) -> RunContext {
        RunContext::new(
            product_type,
            "Test Area",
            "20200101",
            "20200131",
            result_path,
            NaiveDate::from_ymd_opt(2026, 8, 30)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_input_yields_empty_plan_and_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(ProductType::Slc, dir.path());
        let plan = generate_file_list(&[], &ctx).unwrap();
        assert!(plan.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_single_scene_grd_plan() {
        let ctx = context(ProductType::Grd, &PathBuf::from("/tmp"));
        let tiles = vec![
            "/data/S1A_IW_GRDH_1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.SAFE"
                .to_string(),
        ];
        let plan = generate_plan(&tiles, &ctx);
        assert_eq!(plan.jobs.len(), 1);
        assert!(plan.coh_6d.is_empty());
        assert!(plan.coh_12d.is_empty());
        // no manifest on disk: pass direction is unknown and left empty
        assert_eq!(plan.jobs[0].output_name, "20200103_S1A_VVVH_117__DADE_BS");
        assert_eq!(plan.jobs[0].member_paths(), tiles[0]);
    }

    #[test]
    fn test_jobs_come_out_in_ascending_time_order() {
        let ctx = context(ProductType::Grd, &PathBuf::from("/tmp"));
        // discovery order is most recent first
        let tiles = vec![
            "/data/S1A_IW_GRDH_1SDV_20200109T170815_20200109T170842_030700_0382D5_BBBB.SAFE"
                .to_string(),
            "/data/S1A_IW_GRDH_1SDV_20200103T170815_20200103T170842_030639_0382D5_AAAA.SAFE"
                .to_string(),
        ];
        let plan = generate_plan(&tiles, &ctx);
        assert_eq!(plan.jobs.len(), 2);
        assert!(plan.jobs[0].output_name.starts_with("20200103"));
        assert!(plan.jobs[1].output_name.starts_with("20200109"));
    }

    #[test]
    fn test_with_scene_id_disabled() {
        let mut ctx = context(ProductType::Grd, &PathBuf::from("/tmp"));
        ctx.with_scene_id = false;
        let tiles = vec![
            "/data/S1A_IW_GRDH_1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.SAFE"
                .to_string(),
        ];
        let plan = generate_plan(&tiles, &ctx);
        assert_eq!(plan.jobs[0].output_name, "20200103_S1A_VVVH_117__BS");
    }
}
