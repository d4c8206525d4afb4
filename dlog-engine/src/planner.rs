//! Per-record predicate planning.
//!
//! Which of the name, size and host criteria are active is known before the
//! first record is read, so the planner maps that triple to one of eight
//! predicate shapes up front and the scanner's hot loop only ever evaluates
//! the dimensions its shape names. Directory, user and job-id criteria ride
//! along in every shape; they are rare and need the resolver anyway.

use crate::criteria::{Criteria, NameDisplay, NumericFilter};
use crate::pattern::{PatternSet, Verdict};
use crate::resolver::{JobInfo, JobResolver};
use dlog_core::record::DeliveryRecord;

/// The eight predicate shapes, indexed by which of (names, size, hosts)
/// are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Unfiltered,
    Names,
    Size,
    Hosts,
    NamesSize,
    NamesHosts,
    SizeHosts,
    NamesSizeHosts,
}

/// The compiled per-record predicate of one query.
#[derive(Debug)]
pub struct Plan {
    kind: PlanKind,
    names: PatternSet,
    hosts: PatternSet,
    directories: PatternSet,
    users: PatternSet,
    size: Option<NumericFilter>,
    remote_name: bool,
}

impl Plan {
    /// Compile the criteria into a plan. A pure mapping; selected once per
    /// generation.
    pub fn select(criteria: &Criteria) -> crate::error::Result<Plan> {
        let kind = match (
            !criteria.file_names.is_empty(),
            criteria.size.is_some(),
            !criteria.hosts.is_empty(),
        ) {
            (false, false, false) => PlanKind::Unfiltered,
            (true, false, false) => PlanKind::Names,
            (false, true, false) => PlanKind::Size,
            (false, false, true) => PlanKind::Hosts,
            (true, true, false) => PlanKind::NamesSize,
            (true, false, true) => PlanKind::NamesHosts,
            (false, true, true) => PlanKind::SizeHosts,
            (true, true, true) => PlanKind::NamesSizeHosts,
        };

        Ok(Plan {
            kind,
            names: PatternSet::compile(&criteria.file_names)?,
            hosts: PatternSet::compile(&criteria.hosts)?,
            directories: PatternSet::compile(&criteria.directories)?,
            users: PatternSet::compile(&criteria.users)?,
            size: criteria.size,
            remote_name: criteria.name_display == NameDisplay::Remote,
        })
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    /// Apply the predicate to one record.
    pub fn accepts<J: JobInfo>(
        &self,
        criteria: &Criteria,
        record: &DeliveryRecord<'_>,
        resolver: &mut JobResolver<'_, J>,
    ) -> bool {
        let primary = match self.kind {
            PlanKind::Unfiltered => true,
            PlanKind::Names => self.match_names(record),
            PlanKind::Size => self.match_size(record),
            PlanKind::Hosts => self.match_hosts(record),
            PlanKind::NamesSize => self.match_names(record) && self.match_size(record),
            PlanKind::NamesHosts => self.match_names(record) && self.match_hosts(record),
            PlanKind::SizeHosts => self.match_size(record) && self.match_hosts(record),
            PlanKind::NamesSizeHosts => {
                self.match_names(record) && self.match_size(record) && self.match_hosts(record)
            }
        };

        primary && self.match_job_criteria(criteria, record, resolver)
    }

    fn match_names(&self, record: &DeliveryRecord<'_>) -> bool {
        let name = String::from_utf8_lossy(record.display_name(self.remote_name));
        self.names.verdict(&name) == Verdict::Match
    }

    fn match_size(&self, record: &DeliveryRecord<'_>) -> bool {
        match self.size {
            Some(filter) => filter.matches(record.size.as_f64()),
            None => true,
        }
    }

    fn match_hosts(&self, record: &DeliveryRecord<'_>) -> bool {
        let host = String::from_utf8_lossy(record.host_trimmed());
        self.hosts.verdict(&host) == Verdict::Match
    }

    /// The always-on dimensions: job-id set, user globs, directory
    /// globs/ids. Resolution failures fail the filter rather than admitting
    /// unknown jobs.
    fn match_job_criteria<J: JobInfo>(
        &self,
        criteria: &Criteria,
        record: &DeliveryRecord<'_>,
        resolver: &mut JobResolver<'_, J>,
    ) -> bool {
        if !criteria.job_ids.is_empty() && !criteria.job_ids.contains(&record.job_id) {
            return false;
        }

        if !self.users.is_empty() {
            match resolver.resolve_user(record.job_id) {
                Some((user, _mail)) => {
                    if self.users.verdict(user) != Verdict::Match {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if !self.directories.is_empty() || !criteria.dir_ids.is_empty() {
            match resolver.resolve_dir(record.job_id) {
                Some((dir, dir_id)) => {
                    let by_glob =
                        !self.directories.is_empty() && self.directories.verdict(dir) == Verdict::Match;
                    let by_id = criteria.dir_ids.contains(dir_id);
                    if !by_glob && !by_id {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CompareOp;
    use crate::resolver::{JobEntry, NoJobInfo, StaticJobInfo};
    use dlog_core::record::{Decoded, decode_line};
    use dlog_core::LogType;

    fn record_line() -> &'static [u8] {
        b"5f000000|hostA|1 2|foo|rfoo|00a|0.25|0000f|\n"
    }

    fn decode(line: &[u8]) -> DeliveryRecord<'_> {
        match decode_line(line, &LogType::new(b'|', 8, 5)) {
            Decoded::Record { record, .. } => record,
            other => panic!("expected record, got {other:?}"),
        }
    }

    fn accepts(criteria: &Criteria, line: &[u8]) -> bool {
        let plan = Plan::select(criteria).unwrap();
        let info = NoJobInfo;
        let mut resolver = JobResolver::new(&info);
        plan.accepts(criteria, &decode(line), &mut resolver)
    }

    #[test]
    fn triple_maps_to_the_eight_kinds() {
        let cases: [(bool, bool, bool, PlanKind); 8] = [
            (false, false, false, PlanKind::Unfiltered),
            (true, false, false, PlanKind::Names),
            (false, true, false, PlanKind::Size),
            (false, false, true, PlanKind::Hosts),
            (true, true, false, PlanKind::NamesSize),
            (true, false, true, PlanKind::NamesHosts),
            (false, true, true, PlanKind::SizeHosts),
            (true, true, true, PlanKind::NamesSizeHosts),
        ];

        for (names, size, hosts, kind) in cases {
            let mut criteria = Criteria::new();
            if names {
                criteria = criteria.with_file_names(vec!["*".into()]);
            }
            if size {
                criteria =
                    criteria.with_size_filter(NumericFilter::new(CompareOp::Greater, 1.0));
            }
            if hosts {
                criteria = criteria.with_hosts(vec!["host*".into()]);
            }

            assert_eq!(Plan::select(&criteria).unwrap().kind(), kind);
        }
    }

    #[test]
    fn unfiltered_accepts_everything() {
        assert!(accepts(&Criteria::new(), record_line()));
    }

    #[test]
    fn name_and_host_dimensions() {
        let by_name = Criteria::new().with_file_names(vec!["f*".into()]);
        assert!(accepts(&by_name, record_line()));

        let wrong_name = Criteria::new().with_file_names(vec!["g*".into()]);
        assert!(!accepts(&wrong_name, record_line()));

        let by_host = Criteria::new().with_hosts(vec!["hostA".into()]);
        assert!(accepts(&by_host, record_line()));

        let wrong_host = Criteria::new().with_hosts(vec!["hostB".into()]);
        assert!(!accepts(&wrong_host, record_line()));
    }

    #[test]
    fn remote_name_display_matches_the_remote_name() {
        let criteria = Criteria::new()
            .with_file_names(vec!["rf*".into()])
            .with_name_display(NameDisplay::Remote);
        assert!(accepts(&criteria, record_line()));

        let local = Criteria::new().with_file_names(vec!["rf*".into()]);
        assert!(!accepts(&local, record_line()));
    }

    #[test]
    fn size_dimension_with_sentinel() {
        let line: &[u8] = b"5f000000|hostA|1 2|foo|rfoo|0123456789abcdef|0.25|0000f|\n";
        let criteria =
            Criteria::new().with_size_filter(NumericFilter::new(CompareOp::Greater, 1_000_000.0));

        assert!(accepts(&criteria, line));
        assert!(!accepts(
            &Criteria::new().with_size_filter(NumericFilter::new(CompareOp::Less, 1e300)),
            line
        ));
    }

    #[test]
    fn job_id_set_is_always_applied() {
        let matching = Criteria::new().with_job_ids(vec![0xf]);
        assert!(accepts(&matching, record_line()));

        let other = Criteria::new().with_job_ids(vec![0x10]);
        assert!(!accepts(&other, record_line()));
    }

    #[test]
    fn dir_and_user_criteria_resolve_through_job_info() {
        let mut info = StaticJobInfo::default();
        info.insert(
            0xf,
            JobEntry {
                user: "afd".into(),
                mail_destination: String::new(),
                dir: "/incoming/weather".into(),
                dir_id: 7,
            },
        );

        let record_holder = record_line();
        let record = decode(record_holder);

        let by_dir = Criteria::new().with_directories(vec!["/incoming/*".into()]);
        let plan = Plan::select(&by_dir).unwrap();
        let mut resolver = JobResolver::new(&info);
        assert!(plan.accepts(&by_dir, &record, &mut resolver));

        let by_dir_id = Criteria::new().with_dir_ids(vec![7]);
        let plan = Plan::select(&by_dir_id).unwrap();
        let mut resolver = JobResolver::new(&info);
        assert!(plan.accepts(&by_dir_id, &record, &mut resolver));

        let by_user = Criteria::new().with_users(vec!["af*".into()]);
        let plan = Plan::select(&by_user).unwrap();
        let mut resolver = JobResolver::new(&info);
        assert!(plan.accepts(&by_user, &record, &mut resolver));

        let wrong_user = Criteria::new().with_users(vec!["nobody".into()]);
        let plan = Plan::select(&wrong_user).unwrap();
        let mut resolver = JobResolver::new(&info);
        assert!(!plan.accepts(&wrong_user, &record, &mut resolver));

        // Unresolvable jobs fail dir/user filters.
        let no_info = NoJobInfo;
        let plan = Plan::select(&by_user).unwrap();
        let mut resolver = JobResolver::new(&no_info);
        assert!(!plan.accepts(&by_user, &record, &mut resolver));
    }
}
