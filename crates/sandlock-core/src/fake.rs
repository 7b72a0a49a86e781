//! Recording kernel double for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use sandlock_common::constants::LANDLOCK_CREATE_RULESET_VERSION;

use crate::kernel::{Kernel, RuleAttr};
use crate::uapi::RulesetAttr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateRuleset {
        attr: Option<RulesetAttr>,
        size: usize,
        flags: u32,
    },
    AddRule {
        ruleset_fd: RawFd,
        rule_type: u32,
        allowed_access: u64,
        target: i64,
    },
    RestrictSelf {
        ruleset_fd: RawFd,
        flags: u32,
    },
    NoNewPrivs,
    OpenPath(PathBuf),
    Close(RawFd),
}

#[derive(Debug)]
pub(crate) struct FakeKernel {
    abi: u32,
    calls: RefCell<Vec<Call>>,
    next_fd: Cell<RawFd>,
    live: RefCell<BTreeSet<RawFd>>,
    rulesets: RefCell<BTreeMap<RawFd, RulesetAttr>>,
    create_err: Cell<Option<Errno>>,
    add_rule_err: Cell<Option<Errno>>,
    restrict_err: Cell<Option<Errno>>,
    no_new_privs_err: Cell<Option<Errno>>,
}

impl FakeKernel {
    pub(crate) fn with_abi(abi: u32) -> Self {
        Self {
            abi,
            calls: RefCell::new(Vec::new()),
            next_fd: Cell::new(10),
            live: RefCell::new(BTreeSet::new()),
            rulesets: RefCell::new(BTreeMap::new()),
            create_err: Cell::new(None),
            add_rule_err: Cell::new(None),
            restrict_err: Cell::new(None),
            no_new_privs_err: Cell::new(None),
        }
    }

    pub(crate) fn fail_create(&self, errno: Errno) {
        self.create_err.set(Some(errno));
    }

    pub(crate) fn fail_add_rule(&self, errno: Option<Errno>) {
        self.add_rule_err.set(errno);
    }

    pub(crate) fn fail_restrict(&self, errno: Option<Errno>) {
        self.restrict_err.set(errno);
    }

    pub(crate) fn fail_no_new_privs(&self, errno: Option<Errno>) {
        self.no_new_privs_err.set(errno);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Descriptors handed out and not yet closed.
    pub(crate) fn live_fds(&self) -> Vec<RawFd> {
        self.live.borrow().iter().copied().collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self) -> RawFd {
        let fd = self.next_fd.get();
        self.next_fd.set(fd + 1);
        let _ = self.live.borrow_mut().insert(fd);
        fd
    }
}

impl Kernel for FakeKernel {
    fn create_ruleset(
        &self,
        attr: Option<&RulesetAttr>,
        size: usize,
        flags: u32,
    ) -> Result<i64, Errno> {
        self.record(Call::CreateRuleset {
            attr: attr.copied(),
            size,
            flags,
        });
        if flags & LANDLOCK_CREATE_RULESET_VERSION != 0 {
            return self
                .create_err
                .get()
                .map_or(Ok(i64::from(self.abi)), Err);
        }
        if let Some(errno) = self.create_err.get() {
            return Err(errno);
        }
        match attr {
            Some(a) if a.handled_access_fs | a.handled_access_net | a.scoped == 0 => {
                Err(Errno::ENOMSG)
            }
            Some(a) => {
                let fd = self.allocate();
                let _ = self.rulesets.borrow_mut().insert(fd, *a);
                Ok(i64::from(fd))
            }
            None => Err(Errno::EFAULT),
        }
    }

    fn add_rule(&self, ruleset_fd: RawFd, rule: RuleAttr<'_>, _flags: u32) -> Result<(), Errno> {
        let target = match rule {
            RuleAttr::PathBeneath(attr) => i64::from({ attr.parent_fd }),
            #[allow(clippy::cast_possible_wrap)]
            RuleAttr::NetPort(attr) => attr.port as i64,
        };
        self.record(Call::AddRule {
            ruleset_fd,
            rule_type: rule.rule_type(),
            allowed_access: rule.allowed_access(),
            target,
        });
        if let Some(errno) = self.add_rule_err.get() {
            return Err(errno);
        }
        let handled = match (self.rulesets.borrow().get(&ruleset_fd), rule) {
            (None, _) => return Err(Errno::EBADF),
            (Some(a), RuleAttr::PathBeneath(_)) => a.handled_access_fs,
            (Some(a), RuleAttr::NetPort(_)) => a.handled_access_net,
        };
        // Mirrors landlock_add_rule(2): empty grants and unhandled bits are refused.
        match rule.allowed_access() {
            0 => Err(Errno::ENOMSG),
            allowed if allowed & !handled != 0 => Err(Errno::EINVAL),
            _ => Ok(()),
        }
    }

    fn restrict_self(&self, ruleset_fd: RawFd, flags: u32) -> Result<(), Errno> {
        self.record(Call::RestrictSelf { ruleset_fd, flags });
        self.restrict_err.get().map_or(Ok(()), Err)
    }

    fn set_no_new_privs(&self) -> Result<(), Errno> {
        self.record(Call::NoNewPrivs);
        self.no_new_privs_err.get().map_or(Ok(()), Err)
    }

    fn open_path(&self, path: &Path) -> Result<RawFd, Errno> {
        self.record(Call::OpenPath(path.to_path_buf()));
        if path.exists() {
            Ok(self.allocate())
        } else {
            Err(Errno::ENOENT)
        }
    }

    fn close(&self, fd: RawFd) {
        self.record(Call::Close(fd));
        let _ = self.live.borrow_mut().remove(&fd);
        let _ = self.rulesets.borrow_mut().remove(&fd);
    }
}
