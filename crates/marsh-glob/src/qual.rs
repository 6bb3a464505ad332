//! Glob qualifiers: the trailing `(...)` predicate clause.
//!
//! A clause is a comma-separated OR of AND-groups of single-letter
//! predicates over a file's metadata snapshot. Parsing happens at compile
//! time; evaluation is a pure function of a [`FileMeta`], so a failing
//! clause silently drops the candidate rather than erroring.
//!
//! Besides per-file tests, a clause may carry scan-policy modifiers
//! (`M`, `T`, `N`, `D`) that adjust how this one pattern is scanned and
//! collected; those are split out into [`ScanMods`].

use std::path::Path;

use crate::compile::CompileError;
use crate::fs::{FileKind, FileMeta, GlobFs};
use crate::word::Tok;

/// Comparison sense for numeric qualifiers, written `-n` / `n` / `+n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cmp {
    Less,
    Equal,
    Greater,
}

impl Cmp {
    fn test(self, value: u64, operand: u64) -> bool {
        match self {
            Cmp::Less => value < operand,
            Cmp::Equal => value == operand,
            Cmp::Greater => value > operand,
        }
    }
}

/// Which timestamp a time qualifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeField {
    Access,
    Modify,
    Change,
}

/// Unit for time qualifiers; days when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Weeks,
    Months,
    Seconds,
}

impl TimeUnit {
    fn seconds(self) -> u64 {
        match self {
            TimeUnit::Days => 86_400,
            TimeUnit::Hours => 3_600,
            TimeUnit::Minutes => 60,
            TimeUnit::Weeks => 7 * 86_400,
            TimeUnit::Months => 30 * 86_400,
            TimeUnit::Seconds => 1,
        }
    }
}

/// Unit for size qualifiers; bytes when unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeUnit {
    Bytes,
    /// 512-byte blocks.
    Blocks,
    Kilobytes,
    Megabytes,
}

impl SizeUnit {
    fn bytes(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Blocks => 512,
            SizeUnit::Kilobytes => 1 << 10,
            SizeUnit::Megabytes => 1 << 20,
        }
    }
}

/// How an `f` mode spec compares against the permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModeTest {
    /// `f<oct>` / `f=<oct>`: the permission bits equal the spec.
    Exact,
    /// `f+<oct>`: all bits of the spec are set.
    AllSet,
    /// `f-<oct>`: no bit of the spec is set.
    AllClear,
}

/// One predicate over a metadata snapshot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Qual {
    IsDir,
    IsRegular,
    IsSymlink,
    IsSocket,
    IsFifo,
    IsBlock,
    IsChar,
    IsDevice,
    IsExecutable,
    OwnerRead,
    OwnerWrite,
    OwnerExec,
    GroupRead,
    GroupWrite,
    GroupExec,
    WorldRead,
    WorldWrite,
    WorldExec,
    Mode { how: ModeTest, bits: u32 },
    Uid(u32),
    Gid(u32),
    OnDevice(u64),
    Links { cmp: Cmp, count: u64 },
    Size { cmp: Cmp, unit: SizeUnit, value: u64 },
    Time {
        field: TimeField,
        cmp: Cmp,
        unit: TimeUnit,
        value: u64,
    },
}

/// A predicate with its parse-time sense and link-follow state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QualTest {
    pub qual: Qual,
    /// Set by a preceding `^` toggle: the predicate must fail.
    pub negate: bool,
    /// Set by a preceding `-` toggle: read the followed (`stat`)
    /// snapshot instead of the link's own (`lstat`).
    pub follow: bool,
}

/// The whole clause: OR-chained AND-groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QualClause {
    pub groups: Vec<Vec<QualTest>>,
}

impl QualClause {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Scan-policy modifiers: per-pattern overrides that are not file tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ScanMods {
    /// `M` — append `/` to directory matches.
    pub mark_dirs: bool,
    /// `T` — append a type classifier to every match.
    pub list_types: bool,
    /// `N` — this pattern expands to nothing on no match.
    pub null_glob: bool,
    /// `D` — wildcards of this pattern match leading dots.
    pub glob_dots: bool,
}

/// Parse the token content of a trailing qualifier group.
pub(crate) fn parse_clause(toks: &[Tok]) -> Result<(QualClause, ScanMods), CompileError> {
    let chars: Vec<char> = toks.iter().map(|t| t.ch()).collect();
    let mut clause = QualClause::default();
    let mut mods = ScanMods::default();
    let mut group: Vec<QualTest> = Vec::new();
    let mut negate = false;
    let mut follow = false;

    let mut p = 0usize;
    while p < chars.len() {
        let c = chars[p];
        p += 1;
        let qual = match c {
            ',' => {
                if !group.is_empty() {
                    clause.groups.push(std::mem::take(&mut group));
                }
                negate = false;
                follow = false;
                continue;
            }
            '^' => {
                negate = !negate;
                continue;
            }
            '-' => {
                follow = !follow;
                continue;
            }
            'M' => {
                mods.mark_dirs = true;
                continue;
            }
            'T' => {
                mods.list_types = true;
                continue;
            }
            'N' => {
                mods.null_glob = true;
                continue;
            }
            'D' => {
                mods.glob_dots = true;
                continue;
            }
            '/' => Qual::IsDir,
            '.' => Qual::IsRegular,
            '@' => Qual::IsSymlink,
            '=' => Qual::IsSocket,
            'p' => Qual::IsFifo,
            '*' => Qual::IsExecutable,
            '%' => match chars.get(p) {
                Some('b') => {
                    p += 1;
                    Qual::IsBlock
                }
                Some('c') => {
                    p += 1;
                    Qual::IsChar
                }
                _ => Qual::IsDevice,
            },
            'r' => Qual::OwnerRead,
            'w' => Qual::OwnerWrite,
            'x' => Qual::OwnerExec,
            'A' => Qual::GroupRead,
            'I' => Qual::GroupWrite,
            'E' => Qual::GroupExec,
            'R' => Qual::WorldRead,
            'W' => Qual::WorldWrite,
            'X' => Qual::WorldExec,
            'f' => {
                let how = match chars.get(p) {
                    Some('+') => {
                        p += 1;
                        ModeTest::AllSet
                    }
                    Some('-') => {
                        p += 1;
                        ModeTest::AllClear
                    }
                    Some('=') => {
                        p += 1;
                        ModeTest::Exact
                    }
                    _ => ModeTest::Exact,
                };
                let (bits, used) =
                    take_octal(&chars[p..]).ok_or(CompileError::BadQualifier('f'))?;
                p += used;
                Qual::Mode { how, bits }
            }
            'u' => {
                let (id, used) = take_owner(&chars[p..], 'u')?;
                p += used;
                Qual::Uid(id)
            }
            'g' => {
                let (id, used) = take_owner(&chars[p..], 'g')?;
                p += used;
                Qual::Gid(id)
            }
            'd' => {
                let (n, used) =
                    take_number(&chars[p..]).ok_or(CompileError::BadQualifier('d'))?;
                p += used;
                Qual::OnDevice(n)
            }
            'l' => {
                let (cmp, used) = take_cmp(&chars[p..]);
                p += used;
                let (count, used) =
                    take_number(&chars[p..]).ok_or(CompileError::BadQualifier('l'))?;
                p += used;
                Qual::Links { cmp, count }
            }
            'L' => {
                let unit = match chars.get(p) {
                    Some('k' | 'K') => {
                        p += 1;
                        SizeUnit::Kilobytes
                    }
                    Some('m' | 'M') => {
                        p += 1;
                        SizeUnit::Megabytes
                    }
                    Some('p' | 'P') => {
                        p += 1;
                        SizeUnit::Blocks
                    }
                    _ => SizeUnit::Bytes,
                };
                let (cmp, used) = take_cmp(&chars[p..]);
                p += used;
                let (value, used) =
                    take_number(&chars[p..]).ok_or(CompileError::BadQualifier('L'))?;
                p += used;
                Qual::Size { cmp, unit, value }
            }
            'a' | 'm' | 'c' => {
                let field = match c {
                    'a' => TimeField::Access,
                    'm' => TimeField::Modify,
                    _ => TimeField::Change,
                };
                let unit = match chars.get(p) {
                    Some('M') => {
                        p += 1;
                        TimeUnit::Months
                    }
                    Some('w') => {
                        p += 1;
                        TimeUnit::Weeks
                    }
                    Some('h') => {
                        p += 1;
                        TimeUnit::Hours
                    }
                    Some('m') => {
                        p += 1;
                        TimeUnit::Minutes
                    }
                    Some('s') => {
                        p += 1;
                        TimeUnit::Seconds
                    }
                    _ => TimeUnit::Days,
                };
                let (cmp, used) = take_cmp(&chars[p..]);
                p += used;
                let (value, used) =
                    take_number(&chars[p..]).ok_or(CompileError::BadQualifier(c))?;
                p += used;
                Qual::Time {
                    field,
                    cmp,
                    unit,
                    value,
                }
            }
            other => return Err(CompileError::UnknownQualifier(other)),
        };
        group.push(QualTest {
            qual,
            negate,
            follow,
        });
    }
    if !group.is_empty() {
        clause.groups.push(group);
    }
    Ok((clause, mods))
}

/// `u123` or `u:name:`.
fn take_owner(chars: &[char], letter: char) -> Result<(u32, usize), CompileError> {
    if let Some((n, used)) = take_number(chars) {
        return Ok((n as u32, used));
    }
    if chars.first() == Some(&':') {
        let Some(close) = chars[1..].iter().position(|&c| c == ':') else {
            return Err(CompileError::BadQualifier(letter));
        };
        let name: String = chars[1..1 + close].iter().collect();
        let id = if letter == 'u' {
            uid_for_name(&name).ok_or(CompileError::UnknownUser(name))?
        } else {
            gid_for_name(&name).ok_or(CompileError::UnknownGroup(name))?
        };
        return Ok((id, close + 2));
    }
    Err(CompileError::BadQualifier(letter))
}

fn take_cmp(chars: &[char]) -> (Cmp, usize) {
    match chars.first() {
        Some('-') => (Cmp::Less, 1),
        Some('+') => (Cmp::Greater, 1),
        _ => (Cmp::Equal, 0),
    }
}

fn take_number(chars: &[char]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut used = 0usize;
    for c in chars {
        let Some(d) = c.to_digit(10) else { break };
        value = value.saturating_mul(10).saturating_add(d as u64);
        used += 1;
    }
    (used > 0).then_some((value, used))
}

fn take_octal(chars: &[char]) -> Option<(u32, usize)> {
    let mut value = 0u32;
    let mut used = 0usize;
    for c in chars {
        let Some(d) = c.to_digit(8) else { break };
        value = value.saturating_mul(8).saturating_add(d);
        used += 1;
    }
    (used > 0).then_some((value, used))
}

// sysinfo wraps raw ids in platform-specific newtypes; their Display
// form is the numeric id on unix.
fn uid_for_name(name: &str) -> Option<u32> {
    let users = sysinfo::Users::new_with_refreshed_list();
    users
        .iter()
        .find(|u| u.name() == name)
        .and_then(|u| u.id().to_string().parse().ok())
}

fn gid_for_name(name: &str) -> Option<u32> {
    let users = sysinfo::Users::new_with_refreshed_list();
    for user in users.iter() {
        for group in user.groups() {
            if group.name() == name {
                return group.id().to_string().parse().ok();
            }
        }
    }
    None
}

/// Evaluate the clause for one candidate. The clause passes when any
/// group passes; a group passes when every test in it passes after its
/// sense toggle. A candidate whose metadata cannot be read fails.
pub(crate) fn clause_passes<F: GlobFs>(
    fs: &F,
    path: &Path,
    clause: &QualClause,
    now: i64,
) -> bool {
    if clause.is_empty() {
        return true;
    }
    let lmeta = fs.lstat(path).ok();
    // The followed snapshot is fetched at most once, and only if some
    // test wants it.
    let mut fmeta: Option<Option<FileMeta>> = None;

    'group: for group in &clause.groups {
        for test in group {
            let meta = if test.follow {
                fmeta
                    .get_or_insert_with(|| fs.stat(path).ok())
                    .as_ref()
            } else {
                lmeta.as_ref()
            };
            let Some(meta) = meta else {
                continue 'group;
            };
            if qual_test(&test.qual, meta, now) == test.negate {
                continue 'group;
            }
        }
        return true;
    }
    false
}

/// One predicate against one snapshot. Pure.
fn qual_test(qual: &Qual, meta: &FileMeta, now: i64) -> bool {
    match qual {
        Qual::IsDir => meta.kind == FileKind::Directory,
        Qual::IsRegular => meta.kind == FileKind::Regular,
        Qual::IsSymlink => meta.kind == FileKind::Symlink,
        Qual::IsSocket => meta.kind == FileKind::Socket,
        Qual::IsFifo => meta.kind == FileKind::Fifo,
        Qual::IsBlock => meta.kind == FileKind::BlockDevice,
        Qual::IsChar => meta.kind == FileKind::CharDevice,
        Qual::IsDevice => {
            matches!(meta.kind, FileKind::BlockDevice | FileKind::CharDevice)
        }
        Qual::IsExecutable => meta.is_executable(),
        Qual::OwnerRead => meta.mode & 0o400 != 0,
        Qual::OwnerWrite => meta.mode & 0o200 != 0,
        Qual::OwnerExec => meta.mode & 0o100 != 0,
        Qual::GroupRead => meta.mode & 0o040 != 0,
        Qual::GroupWrite => meta.mode & 0o020 != 0,
        Qual::GroupExec => meta.mode & 0o010 != 0,
        Qual::WorldRead => meta.mode & 0o004 != 0,
        Qual::WorldWrite => meta.mode & 0o002 != 0,
        Qual::WorldExec => meta.mode & 0o001 != 0,
        Qual::Mode { how, bits } => match how {
            ModeTest::Exact => meta.mode & 0o7777 == *bits,
            ModeTest::AllSet => meta.mode & bits == *bits,
            ModeTest::AllClear => meta.mode & bits == 0,
        },
        Qual::Uid(id) => meta.uid == *id,
        Qual::Gid(id) => meta.gid == *id,
        Qual::OnDevice(dev) => meta.dev == *dev,
        Qual::Links { cmp, count } => cmp.test(meta.nlink, *count),
        Qual::Size { cmp, unit, value } => {
            let unit_bytes = unit.bytes();
            // Sizes round up to whole units, so a 1-byte file is "1KB"
            // for `Lk1`.
            let in_units = if unit_bytes == 1 {
                meta.size
            } else {
                meta.size.div_ceil(unit_bytes)
            };
            cmp.test(in_units, *value)
        }
        Qual::Time {
            field,
            cmp,
            unit,
            value,
        } => {
            let stamp = match field {
                TimeField::Access => meta.atime,
                TimeField::Modify => meta.mtime,
                TimeField::Change => meta.ctime,
            };
            let age = (now - stamp).max(0) as u64 / unit.seconds();
            cmp.test(age, *value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn parse(s: &str) -> Result<(QualClause, ScanMods), CompileError> {
        parse_clause(Word::parse(s).toks())
    }

    fn meta(kind: FileKind, mode: u32) -> FileMeta {
        FileMeta {
            kind,
            mode,
            uid: 1000,
            gid: 100,
            nlink: 1,
            size: 0,
            dev: 7,
            ino: 42,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    #[test]
    fn parses_type_letters() {
        let (clause, _) = parse(".").unwrap();
        assert_eq!(clause.groups, vec![vec![QualTest {
            qual: Qual::IsRegular,
            negate: false,
            follow: false,
        }]]);

        let (clause, _) = parse("/").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::IsDir);
    }

    #[test]
    fn comma_separates_or_groups() {
        let (clause, _) = parse(".,/").unwrap();
        assert_eq!(clause.groups.len(), 2);
        assert_eq!(clause.groups[0][0].qual, Qual::IsRegular);
        assert_eq!(clause.groups[1][0].qual, Qual::IsDir);
    }

    #[test]
    fn caret_toggles_sense_within_a_group() {
        let (clause, _) = parse("^/x").unwrap();
        let group = &clause.groups[0];
        assert!(group[0].negate);
        assert!(group[1].negate);

        // Toggling twice restores the sense; a comma resets it.
        let (clause, _) = parse("^^/,^.").unwrap();
        assert!(!clause.groups[0][0].negate);
        assert!(clause.groups[1][0].negate);
    }

    #[test]
    fn dash_toggles_link_follow() {
        let (clause, _) = parse("-@").unwrap();
        assert!(clause.groups[0][0].follow);
    }

    #[test]
    fn scan_mods_are_not_file_tests() {
        let (clause, mods) = parse("N").unwrap();
        assert!(clause.is_empty());
        assert!(mods.null_glob);

        let (clause, mods) = parse("DM.T").unwrap();
        assert!(mods.glob_dots && mods.mark_dirs && mods.list_types);
        assert_eq!(clause.groups[0].len(), 1);
    }

    #[test]
    fn size_qualifier_units_and_sense() {
        let (clause, _) = parse("Lk+10").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Size {
            cmp: Cmp::Greater,
            unit: SizeUnit::Kilobytes,
            value: 10,
        });

        let (clause, _) = parse("L-512").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Size {
            cmp: Cmp::Less,
            unit: SizeUnit::Bytes,
            value: 512,
        });

        let (clause, _) = parse("Lp1").unwrap();
        assert!(matches!(clause.groups[0][0].qual, Qual::Size {
            unit: SizeUnit::Blocks,
            ..
        }));
    }

    #[test]
    fn time_qualifier_fields_and_units() {
        let (clause, _) = parse("mh-1").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Time {
            field: TimeField::Modify,
            cmp: Cmp::Less,
            unit: TimeUnit::Hours,
            value: 1,
        });

        let (clause, _) = parse("a+7").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Time {
            field: TimeField::Access,
            cmp: Cmp::Greater,
            unit: TimeUnit::Days,
            value: 7,
        });

        let (clause, _) = parse("cM1").unwrap();
        assert!(matches!(clause.groups[0][0].qual, Qual::Time {
            field: TimeField::Change,
            unit: TimeUnit::Months,
            ..
        }));
    }

    #[test]
    fn mode_spec_forms() {
        let (clause, _) = parse("f755").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Mode {
            how: ModeTest::Exact,
            bits: 0o755,
        });

        let (clause, _) = parse("f+111").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Mode {
            how: ModeTest::AllSet,
            bits: 0o111,
        });

        let (clause, _) = parse("f-022").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Mode {
            how: ModeTest::AllClear,
            bits: 0o022,
        });
    }

    #[test]
    fn numeric_owner_and_device() {
        let (clause, _) = parse("u1000").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::Uid(1000));

        let (clause, _) = parse("g100d7l+1").unwrap();
        let group = &clause.groups[0];
        assert_eq!(group[0].qual, Qual::Gid(100));
        assert_eq!(group[1].qual, Qual::OnDevice(7));
        assert_eq!(group[2].qual, Qual::Links {
            cmp: Cmp::Greater,
            count: 1,
        });
    }

    #[test]
    fn device_refinements() {
        let (clause, _) = parse("%").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::IsDevice);
        let (clause, _) = parse("%b").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::IsBlock);
        let (clause, _) = parse("%c").unwrap();
        assert_eq!(clause.groups[0][0].qual, Qual::IsChar);
    }

    #[test]
    fn bad_and_unknown_qualifiers() {
        assert_eq!(parse("q"), Err(CompileError::UnknownQualifier('q')));
        assert_eq!(parse("l"), Err(CompileError::BadQualifier('l')));
        assert_eq!(parse("u:nosuch"), Err(CompileError::BadQualifier('u')));
        assert_eq!(parse("f"), Err(CompileError::BadQualifier('f')));
    }

    #[test]
    fn predicate_type_tests() {
        assert!(qual_test(&Qual::IsDir, &meta(FileKind::Directory, 0o755), 0));
        assert!(!qual_test(&Qual::IsDir, &meta(FileKind::Regular, 0o644), 0));
        assert!(qual_test(
            &Qual::IsDevice,
            &meta(FileKind::CharDevice, 0o600),
            0
        ));
        assert!(qual_test(
            &Qual::IsExecutable,
            &meta(FileKind::Regular, 0o755),
            0
        ));
        assert!(!qual_test(
            &Qual::IsExecutable,
            &meta(FileKind::Directory, 0o755),
            0
        ));
    }

    #[test]
    fn predicate_permission_bits() {
        let m = meta(FileKind::Regular, 0o640);
        assert!(qual_test(&Qual::OwnerRead, &m, 0));
        assert!(qual_test(&Qual::OwnerWrite, &m, 0));
        assert!(!qual_test(&Qual::OwnerExec, &m, 0));
        assert!(qual_test(&Qual::GroupRead, &m, 0));
        assert!(!qual_test(&Qual::GroupWrite, &m, 0));
        assert!(!qual_test(&Qual::WorldRead, &m, 0));
    }

    #[test]
    fn predicate_size_rounds_up_to_units() {
        let mut m = meta(FileKind::Regular, 0o644);
        m.size = 1;
        assert!(qual_test(
            &Qual::Size {
                cmp: Cmp::Equal,
                unit: SizeUnit::Kilobytes,
                value: 1
            },
            &m,
            0
        ));
        m.size = 2048;
        assert!(qual_test(
            &Qual::Size {
                cmp: Cmp::Greater,
                unit: SizeUnit::Kilobytes,
                value: 1
            },
            &m,
            0
        ));
        assert!(qual_test(
            &Qual::Size {
                cmp: Cmp::Equal,
                unit: SizeUnit::Blocks,
                value: 4
            },
            &m,
            0
        ));
    }

    #[test]
    fn predicate_time_ages() {
        let mut m = meta(FileKind::Regular, 0o644);
        let now = 10 * 86_400;
        m.mtime = now - 3 * 86_400;
        let q = |cmp, value| Qual::Time {
            field: TimeField::Modify,
            cmp,
            unit: TimeUnit::Days,
            value,
        };
        assert!(qual_test(&q(Cmp::Equal, 3), &m, now));
        assert!(qual_test(&q(Cmp::Less, 7), &m, now));
        assert!(qual_test(&q(Cmp::Greater, 1), &m, now));
        assert!(!qual_test(&q(Cmp::Less, 3), &m, now));
    }

    #[test]
    fn predicate_mode_spec() {
        let m = meta(FileKind::Regular, 0o100755);
        assert!(qual_test(
            &Qual::Mode {
                how: ModeTest::Exact,
                bits: 0o755
            },
            &m,
            0
        ));
        assert!(qual_test(
            &Qual::Mode {
                how: ModeTest::AllSet,
                bits: 0o111
            },
            &m,
            0
        ));
        assert!(!qual_test(
            &Qual::Mode {
                how: ModeTest::AllClear,
                bits: 0o022
            },
            &m,
            0
        ));
        assert!(qual_test(
            &Qual::Mode {
                how: ModeTest::AllClear,
                bits: 0o002
            },
            &m,
            0
        ));
    }

    #[test]
    fn clause_evaluation_over_a_fake_fs() {
        use std::io;

        struct OneFile {
            lstat: FileMeta,
            stat: FileMeta,
        }
        impl GlobFs for OneFile {
            fn read_dir(&self, _: &Path) -> io::Result<Vec<String>> {
                Ok(Vec::new())
            }
            fn stat(&self, _: &Path) -> io::Result<FileMeta> {
                Ok(self.stat)
            }
            fn lstat(&self, _: &Path) -> io::Result<FileMeta> {
                Ok(self.lstat)
            }
        }

        // A symlink pointing at a directory.
        let fs = OneFile {
            lstat: meta(FileKind::Symlink, 0o777),
            stat: meta(FileKind::Directory, 0o755),
        };
        let path = Path::new("link");

        let (clause, _) = parse("@").unwrap();
        assert!(clause_passes(&fs, path, &clause, 0));

        // Without the follow toggle the link is not a directory...
        let (clause, _) = parse("/").unwrap();
        assert!(!clause_passes(&fs, path, &clause, 0));
        // ...with it, it is.
        let (clause, _) = parse("-/").unwrap();
        assert!(clause_passes(&fs, path, &clause, 0));

        // OR groups short-circuit; negation flips a failing test.
        let (clause, _) = parse(".,@").unwrap();
        assert!(clause_passes(&fs, path, &clause, 0));
        let (clause, _) = parse("^@").unwrap();
        assert!(!clause_passes(&fs, path, &clause, 0));
        let (clause, _) = parse("^.").unwrap();
        assert!(clause_passes(&fs, path, &clause, 0));
    }
}
