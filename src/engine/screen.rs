//! Stay-point screening of a GeoLife `Data` root, ahead of full pipeline runs.

use {
    crate::{
        analysis::StayPointDetector,
        data::{list_geolife_users, read_geolife_user},
        domain::RawFix,
    },
    anyhow::Result,
    chrono::FixedOffset,
    rayon::prelude::*,
    std::path::Path,
};

/// Screening result of one user.
#[derive(Debug)]
pub struct ScreenedUser {
    pub user_id: String,
    pub outcome: Result<ScreenCount>,
}

#[derive(Debug)]
pub struct ScreenCount {
    pub stay_points: usize,
    /// The user's fixes, kept only for users that passed when the caller asked for them.
    pub fixes: Option<Vec<RawFix>>,
}

impl ScreenedUser {
    pub fn passed(&self, min_stay_points: usize) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(|c| c.stay_points >= min_stay_points)
    }
}

/// Reads and detects every user under `root` in parallel. With `keep_fixes`, users meeting
/// `min_stay_points` keep their parsed fixes so a follow-up batch need not read them again.
/// A user whose trajectories fail to load gets an error outcome; the rest carry on.
pub fn screen_users(
    root: &Path,
    offset: FixedOffset,
    detector: &StayPointDetector,
    min_stay_points: usize,
    keep_fixes: bool,
) -> Result<Vec<ScreenedUser>> {
    let users = list_geolife_users(root)?;
    log::info!("Screening {} users under {}", users.len(), root.display());

    let screened: Vec<ScreenedUser> = users
        .into_par_iter()
        .map(|(user_id, dir)| {
            let outcome = read_geolife_user(&dir, offset).and_then(|fixes| {
                let stay_points = detector.detect(&fixes)?.count();
                let keep = keep_fixes && stay_points >= min_stay_points;
                Ok(ScreenCount {
                    stay_points,
                    fixes: keep.then_some(fixes),
                })
            });
            ScreenedUser { user_id, outcome }
        })
        .collect();

    let passed = screened.iter().filter(|u| u.passed(min_stay_points)).count();
    log::info!(
        "{} of {} users have at least {} stay points.",
        passed,
        screened.len(),
        min_stay_points
    );
    Ok(screened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::constants, data::geolife_offset};
    use std::{fs, io::Write, path::PathBuf};

    const PLT_HEADER: &str = "Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n0,2,255,My Track,0,0,2,8421376\n0\n";

    fn scratch_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("haunts-screen-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// One `.plt` file with a fix every 10 minutes for `hours` at a single spot.
    fn write_user(root: &Path, user: &str, hours: u32) {
        let dir = root.join(user).join("Trajectory");
        fs::create_dir_all(&dir).unwrap();
        let mut body = PLT_HEADER.to_string();
        for i in 0..=hours * 6 {
            let (h, m) = (i / 6, (i % 6) * 10);
            body.push_str(&format!("39.98,116.31,0,100,39744.0,2008-10-23,{h:02}:{m:02}:00\n"));
        }
        let mut f = fs::File::create(dir.join("20081023000000.plt")).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    fn detector() -> StayPointDetector {
        StayPointDetector::new(constants::detector::DEFAULT).unwrap()
    }

    #[test]
    fn only_passing_users_keep_their_fixes() {
        let root = scratch_root("keep");
        write_user(&root, "000", 2);
        write_user(&root, "001", 0);

        let screened = screen_users(&root, geolife_offset(), &detector(), 1, true).unwrap();
        assert_eq!(screened.len(), 2);

        let stayed = &screened[0];
        assert_eq!(stayed.user_id, "000");
        assert!(stayed.passed(1));
        let count = stayed.outcome.as_ref().unwrap();
        assert_eq!(count.stay_points, 1);
        assert_eq!(count.fixes.as_ref().map(Vec::len), Some(13));

        let sparse = &screened[1];
        assert!(!sparse.passed(1));
        assert!(sparse.outcome.as_ref().unwrap().fixes.is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn fixes_are_dropped_unless_requested() {
        let root = scratch_root("drop");
        write_user(&root, "000", 2);

        let screened = screen_users(&root, geolife_offset(), &detector(), 1, false).unwrap();
        let count = screened[0].outcome.as_ref().unwrap();
        assert_eq!(count.stay_points, 1);
        assert!(count.fixes.is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn unreadable_user_does_not_stop_the_scan() {
        let root = scratch_root("bad");
        write_user(&root, "000", 2);
        let bad = root.join("001").join("Trajectory");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("broken.plt"), format!("{PLT_HEADER}not,a,fix\n")).unwrap();

        let screened = screen_users(&root, geolife_offset(), &detector(), 1, true).unwrap();
        assert!(screened[0].passed(1));
        assert!(screened[1].outcome.is_err());

        let _ = fs::remove_dir_all(&root);
    }
}
