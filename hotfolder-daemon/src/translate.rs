//! Translation of `notify` events into [`FsEvent`]s.
//!
//! Backends disagree on renames: inotify and Windows report the old name
//! (`Name(From)`), the new name (`Name(To)`) and then both together
//! (`Name(Both)`); FSEvents reports each side as `Name(Any)`. The combined
//! event is dropped so every path is seen once, and `Name(Any)` is resolved
//! by checking whether the path still exists.

use std::path::{Path, PathBuf};

use hotfolder_core::{FsEvent, FsOp};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

/// How a notify kind maps onto an [`FsOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    Fixed(FsOp),
    /// `Create` if the path exists now, `Rename` otherwise.
    ByExistence,
    Skip,
}

pub fn mapping(kind: &EventKind) -> Mapping {
    match kind {
        EventKind::Create(CreateKind::Folder) => Mapping::Skip,
        EventKind::Create(_) => Mapping::Fixed(FsOp::Create),

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Mapping::Fixed(FsOp::Rename),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Mapping::Fixed(FsOp::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Mapping::Skip,
        EventKind::Modify(ModifyKind::Name(_)) => Mapping::ByExistence,
        EventKind::Modify(ModifyKind::Metadata(_)) => Mapping::Skip,
        EventKind::Modify(_) => Mapping::Fixed(FsOp::Write),

        EventKind::Remove(RemoveKind::Folder) => Mapping::Skip,
        EventKind::Remove(_) => Mapping::Fixed(FsOp::Remove),

        EventKind::Access(_) | EventKind::Any | EventKind::Other => Mapping::Skip,
    }
}

/// One [`FsEvent`] per path of `event`, or none if the kind is not handled.
pub fn translate(event: &Event, exists: impl Fn(&Path) -> bool) -> Vec<FsEvent> {
    let op_for = |path: &Path| match mapping(&event.kind) {
        Mapping::Fixed(op) => Some(op),
        Mapping::ByExistence if exists(path) => Some(FsOp::Create),
        Mapping::ByExistence => Some(FsOp::Rename),
        Mapping::Skip => None,
    };
    event
        .paths
        .iter()
        .filter_map(|path| op_for(path).map(|op| FsEvent::new(op, path.clone())))
        .collect()
}

/// Maps backend paths (canonical, absolute) back onto the configured hot
/// directory, so `/abs/project/hot/a.txt` is recorded as `./hot/a.txt`.
#[derive(Debug, Clone)]
pub struct PathRebase {
    watched: PathBuf,
    configured: PathBuf,
}

impl PathRebase {
    pub fn new(watched: impl Into<PathBuf>, configured: impl Into<PathBuf>) -> Self {
        Self {
            watched: watched.into(),
            configured: configured.into(),
        }
    }

    pub fn apply(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.watched) {
            Ok(rest) => self.configured.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind};
    use rstest::rstest;

    #[rstest]
    #[case(EventKind::Create(CreateKind::File), Mapping::Fixed(FsOp::Create))]
    #[case(EventKind::Create(CreateKind::Any), Mapping::Fixed(FsOp::Create))]
    #[case(EventKind::Create(CreateKind::Folder), Mapping::Skip)]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), Mapping::Fixed(FsOp::Write))]
    #[case(EventKind::Modify(ModifyKind::Any), Mapping::Fixed(FsOp::Write))]
    #[case(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)), Mapping::Skip)]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::From)), Mapping::Fixed(FsOp::Rename))]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::To)), Mapping::Fixed(FsOp::Create))]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), Mapping::Skip)]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), Mapping::ByExistence)]
    #[case(EventKind::Remove(RemoveKind::File), Mapping::Fixed(FsOp::Remove))]
    #[case(EventKind::Remove(RemoveKind::Folder), Mapping::Skip)]
    #[case(EventKind::Access(AccessKind::Any), Mapping::Skip)]
    #[case(EventKind::Other, Mapping::Skip)]
    fn kind_mapping(#[case] kind: EventKind, #[case] expected: Mapping) {
        assert_eq!(mapping(&kind), expected);
    }

    #[test]
    fn ambiguous_rename_resolves_by_existence() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path(PathBuf::from("/w/old.txt"))
            .add_path(PathBuf::from("/w/new.txt"));

        let translated = translate(&event, |p| p.ends_with("new.txt"));

        assert_eq!(
            translated,
            vec![
                FsEvent::new(FsOp::Rename, "/w/old.txt"),
                FsEvent::new(FsOp::Create, "/w/new.txt"),
            ]
        );
    }

    #[test]
    fn skipped_kind_yields_nothing() {
        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path(PathBuf::from("/w/a"));
        assert!(translate(&event, |_| true).is_empty());
    }

    #[test]
    fn rebase_maps_watched_prefix_onto_configured_dir() {
        let rebase = PathRebase::new("/private/tmp/x/hot", "./hot");
        assert_eq!(
            rebase.apply(Path::new("/private/tmp/x/hot/report.txt")),
            PathBuf::from("./hot/report.txt")
        );
        assert_eq!(
            rebase.apply(Path::new("/elsewhere/a.txt")),
            PathBuf::from("/elsewhere/a.txt")
        );
    }
}
