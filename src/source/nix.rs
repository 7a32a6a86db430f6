//! NixOS system profile backend.
//!
//! Implements the collaborator seams against a NixOS host:
//! - snapshots from `nix-env -p <profile> --list-generations`
//! - protected ids from the `/run/current-system` symlink target
//! - content delta from `git diff --numstat` between the commits nearest
//!   to two generation times
//! - structural delta from the symmetric difference of `nix-store -qR`
//!   closure path sets
//! - deletion via `nix-env --delete-generations` followed by a store GC
//!
//! Handles gracefully:
//! - nix tooling missing from PATH
//! - no git repository at the configured path
//! - generation links that no longer resolve
//!
//! Every failure surfaces as an `Err(String)` so the engine can fail open.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{Deleter, ProtectedIds, RawFeatures, SnapshotId, SnapshotInfo, SnapshotSource};

pub const DEFAULT_PROFILE: &str = "/nix/var/nix/profiles/system";
pub const DEFAULT_REPO: &str = "/etc/nixos";

const CURRENT_SYSTEM_LINK: &str = "/run/current-system";

pub struct NixProfileSource {
    pub profile: PathBuf,
    pub repo: PathBuf,
}

impl NixProfileSource {
    pub fn new(profile: PathBuf, repo: PathBuf) -> Self {
        NixProfileSource { profile, repo }
    }

    fn generation_link(&self, id: SnapshotId) -> PathBuf {
        PathBuf::from(format!("{}-{id}-link", self.profile.display()))
    }

    fn closure_paths(&self, id: SnapshotId) -> Result<HashSet<String>, String> {
        let link = self.generation_link(id);
        let real = fs::canonicalize(&link)
            .map_err(|e| format!("generation {id}: cannot resolve {}: {e}", link.display()))?;
        let stdout = run_command("nix-store", &["-qR", &real.to_string_lossy()])?;
        Ok(stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    fn commit_at(&self, ts: DateTime<Utc>) -> Result<Option<String>, String> {
        let repo = self.repo.to_string_lossy();
        let before = format!("--before={}", ts.to_rfc3339());
        let stdout = run_command("git", &["-C", &repo, "rev-list", "-1", &before, "HEAD"])?;
        let commit = stdout.trim();
        Ok(if commit.is_empty() { None } else { Some(commit.to_string()) })
    }

    fn git_lines_delta(
        &self,
        older: DateTime<Utc>,
        newer: DateTime<Utc>,
    ) -> Result<u64, String> {
        if !self.repo.join(".git").is_dir() {
            // no repo configured on this host; content delta contributes nothing
            return Ok(0);
        }

        let (old, new) = match (self.commit_at(older)?, self.commit_at(newer)?) {
            (Some(old), Some(new)) if old != new => (old, new),
            _ => return Ok(0),
        };

        let repo = self.repo.to_string_lossy();
        let stdout = run_command("git", &["-C", &repo, "diff", "--numstat", &old, &new])?;
        Ok(parse_numstat(&stdout))
    }
}

impl SnapshotSource for NixProfileSource {
    fn name(&self) -> &'static str {
        "nix-profile"
    }

    fn enumerate(&self) -> Result<Vec<SnapshotInfo>, String> {
        let profile = self.profile.to_string_lossy();
        let stdout = run_command("nix-env", &["-p", &profile, "--list-generations"])?;
        Ok(parse_generations(&stdout))
    }

    fn protected(&self) -> ProtectedIds {
        let current = fs::canonicalize(CURRENT_SYSTEM_LINK)
            .ok()
            .and_then(|target| generation_from_link(&target));
        // the previously booted generation is not recorded anywhere
        // reliable; current-1 is the conservative guess
        let previous = current.map(|c| c.saturating_sub(1).max(1));
        ProtectedIds { current, previous }
    }

    fn raw_features(
        &self,
        older: &SnapshotInfo,
        newer: &SnapshotInfo,
    ) -> Result<RawFeatures, String> {
        let content_delta = self.git_lines_delta(older.timestamp, newer.timestamp)?;

        let older_paths = self.closure_paths(older.id)?;
        let newer_paths = self.closure_paths(newer.id)?;
        let added = newer_paths.difference(&older_paths).count() as u64;
        let removed = older_paths.difference(&newer_paths).count() as u64;

        Ok(RawFeatures {
            content_delta,
            structural_delta: added + removed,
        })
    }
}

pub struct NixDeleter {
    pub profile: PathBuf,
}

impl Deleter for NixDeleter {
    fn name(&self) -> &'static str {
        "nix-env"
    }

    fn delete(&self, ids: &[SnapshotId]) -> Result<(), String> {
        if ids.is_empty() {
            return Ok(());
        }

        let profile = self.profile.to_string_lossy();
        let list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        run_command("nix-env", &["-p", &profile, "--delete-generations", &list])?;

        // best-effort store GC once the profile has dropped its references
        let _ = run_command("nix-collect-garbage", &[]);
        let _ = run_command("nix-store", &["--gc"]);

        Ok(())
    }
}

fn run_command(cmd: &str, args: &[&str]) -> Result<String, String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|e| format!("{cmd}: failed to run command: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{cmd}: command failed: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `nix-env --list-generations` output into snapshots sorted by
/// timestamp. Lines that do not look like a generation row (headers,
/// trailing markers) are skipped.
fn parse_generations(stdout: &str) -> Vec<SnapshotInfo> {
    let mut generations: Vec<SnapshotInfo> = stdout
        .lines()
        .filter_map(parse_generation_line)
        .collect();
    generations.sort_by_key(|g| g.timestamp);
    generations
}

/// Typical row: `  123   2025-08-12 12:34:56   (current)`
fn parse_generation_line(line: &str) -> Option<SnapshotInfo> {
    let mut parts = line.split_whitespace();
    let id: SnapshotId = parts.next()?.parse().ok()?;
    let date = parts.next()?;
    let time = parts.next()?;
    let naive =
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").ok()?;
    Some(SnapshotInfo {
        id,
        timestamp: naive.and_utc(),
    })
}

/// Extract the generation number from a `system-<N>-link` profile target.
fn generation_from_link(target: &Path) -> Option<SnapshotId> {
    let name = target.file_name()?.to_str()?;
    name.strip_prefix("system-")?
        .strip_suffix("-link")?
        .parse()
        .ok()
}

/// Sum added + deleted lines from `git diff --numstat` output.
/// Binary files report `-` columns and are skipped.
fn parse_numstat(stdout: &str) -> u64 {
    let mut total = 0u64;
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(added), Some(deleted)) = (parts.next(), parts.next()) {
            if let (Ok(added), Ok(deleted)) = (added.parse::<u64>(), deleted.parse::<u64>()) {
                total += added + deleted;
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_generation_row() {
        let snap = parse_generation_line("  123   2025-08-12 12:34:56").unwrap();
        assert_eq!(snap.id, 123);
        assert_eq!(
            snap.timestamp,
            Utc.with_ymd_and_hms(2025, 8, 12, 12, 34, 56).unwrap()
        );
    }

    #[test]
    fn parses_current_marker_row() {
        let snap = parse_generation_line(" 456   2025-08-12 09:00:00   (current)").unwrap();
        assert_eq!(snap.id, 456);
    }

    #[test]
    fn rejects_header_and_garbage_rows() {
        assert!(parse_generation_line("Generations for profile:").is_none());
        assert!(parse_generation_line("").is_none());
        assert!(parse_generation_line("abc 2025-08-12 09:00:00").is_none());
        assert!(parse_generation_line("12 not-a-date 09:00:00").is_none());
    }

    #[test]
    fn generations_come_back_sorted_by_time() {
        let stdout = "\
 12   2025-08-12 09:00:00
 10   2025-08-10 09:00:00
 11   2025-08-11 09:00:00   (current)
";
        let gens = parse_generations(stdout);
        let ids: Vec<SnapshotId> = gens.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn extracts_generation_from_system_link() {
        let target = Path::new("/nix/var/nix/profiles/system-87-link");
        assert_eq!(generation_from_link(target), Some(87));
        assert_eq!(generation_from_link(Path::new("/run/booted-system")), None);
        assert_eq!(
            generation_from_link(Path::new("/nix/var/nix/profiles/system-x-link")),
            None
        );
    }

    #[test]
    fn numstat_sums_added_and_deleted() {
        let stdout = "\
10\t3\tmodules/base.nix
0\t0\tREADME.md
-\t-\tassets/logo.png
5\t2\thosts/gate/default.nix
";
        assert_eq!(parse_numstat(stdout), 20);
    }

    #[test]
    fn numstat_empty_diff_is_zero() {
        assert_eq!(parse_numstat(""), 0);
    }
}
