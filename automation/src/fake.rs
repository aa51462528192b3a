//! In-memory automation for tests.
//!
//! A [`FakeHost`] plays the engineering environment according to a
//! [`FakeBehavior`] and records every call it receives in a shared
//! [`FakeState`], so that tests can check both the outcome of a run and the
//! calls that led to it.

use std::{
    cell::{Ref, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    diagnostics::ErrorItem,
    error::AutomationError,
    session::{AutomationHost, IdeSession, SessionKiller, SessionRequest},
    tree::{
        child_path, PlcProject, SystemManager, TreeItem, PLC_CONFIGURATION, REAL_TIME_TASKS,
    },
};

/// How the fake environment responds.
#[derive(Debug, Clone)]
pub struct FakeBehavior {
    pub open_fails: bool,
    pub load_fails: bool,
    pub build_fails: bool,
    pub error_items: Vec<ErrorItem>,
    /// Number of PLC projects below the PLC configuration node.
    pub plc_project_count: usize,
    /// The name that `TIPC^<name>` resolves for. Other names are not found.
    pub plc_project_name: String,
    pub plc_project_xml: String,
    /// Real-time tasks as (name, XML) pairs.
    pub tasks: Vec<(String, String)>,
    pub check_all_objects: bool,
    pub check_fails: bool,
    pub save_fails: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        FakeBehavior {
            open_fails: false,
            load_fails: false,
            build_fails: false,
            error_items: vec![],
            plc_project_count: 1,
            plc_project_name: String::from("Library^Library Project"),
            plc_project_xml: String::from(
                "<TreeItem><ItemName>Library Project</ItemName><PlcProjectDef><AdsPort>851</AdsPort></PlcProjectDef></TreeItem>",
            ),
            tasks: vec![],
            check_all_objects: true,
            check_fails: false,
            save_fails: false,
        }
    }
}

/// What the fake environment has seen.
#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub requests: Vec<SessionRequest>,
    pub loaded_solution: Option<PathBuf>,
    pub plc_project_xml: String,
    pub tasks: Vec<(String, String)>,
    pub saved_library: Option<(PathBuf, bool)>,
    pub closed: bool,
}

struct Shared {
    behavior: FakeBehavior,
    state: RefCell<FakeState>,
    killed: Arc<AtomicBool>,
}

impl Shared {
    fn record(&self, call: impl Into<String>) {
        self.state.borrow_mut().calls.push(call.into());
    }

    fn fail(&self, operation: &'static str) -> AutomationError {
        AutomationError::call_failed(operation, "scripted failure")
    }
}

/// An automation host backed by memory.
#[derive(Clone)]
pub struct FakeHost {
    shared: Rc<Shared>,
}

impl FakeHost {
    pub fn new(behavior: FakeBehavior) -> Self {
        let state = FakeState {
            plc_project_xml: behavior.plc_project_xml.clone(),
            tasks: behavior.tasks.clone(),
            ..FakeState::default()
        };
        FakeHost {
            shared: Rc::new(Shared {
                behavior,
                state: RefCell::new(state),
                killed: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    pub fn state(&self) -> Ref<'_, FakeState> {
        self.shared.state.borrow()
    }

    /// Returns true if a session was ended through its killer.
    pub fn was_killed(&self) -> bool {
        self.shared.killed.load(Ordering::SeqCst)
    }
}

impl AutomationHost for FakeHost {
    fn open(&self, request: &SessionRequest) -> Result<Box<dyn IdeSession>, AutomationError> {
        self.shared.record("open");
        self.shared
            .state
            .borrow_mut()
            .requests
            .push(request.clone());
        if self.shared.behavior.open_fails {
            return Err(self.shared.fail("open"));
        }
        Ok(Box::new(FakeSession {
            shared: self.shared.clone(),
        }))
    }
}

struct FakeSession {
    shared: Rc<Shared>,
}

impl IdeSession for FakeSession {
    fn load_solution(&mut self, path: &Path) -> Result<(), AutomationError> {
        self.shared.record("load_solution");
        if self.shared.behavior.load_fails {
            return Err(self.shared.fail("load_solution"));
        }
        self.shared.state.borrow_mut().loaded_solution = Some(path.to_path_buf());
        Ok(())
    }

    fn clean_solution(&mut self) -> Result<(), AutomationError> {
        self.shared.record("clean_solution");
        Ok(())
    }

    fn build_solution(&mut self) -> Result<(), AutomationError> {
        self.shared.record("build_solution");
        if self.shared.behavior.build_fails {
            return Err(self.shared.fail("build_solution"));
        }
        Ok(())
    }

    fn error_items(&self) -> Result<Vec<ErrorItem>, AutomationError> {
        self.shared.record("error_items");
        Ok(self.shared.behavior.error_items.clone())
    }

    fn system_manager(&self) -> Result<Box<dyn SystemManager>, AutomationError> {
        Ok(Box::new(FakeSystemManager {
            shared: self.shared.clone(),
        }))
    }

    fn killer(&self) -> Arc<dyn SessionKiller> {
        Arc::new(FakeKiller {
            killed: self.shared.killed.clone(),
        })
    }

    fn close(&mut self) -> Result<(), AutomationError> {
        self.shared.record("close");
        self.shared.state.borrow_mut().closed = true;
        Ok(())
    }
}

struct FakeKiller {
    killed: Arc<AtomicBool>,
}

impl SessionKiller for FakeKiller {
    fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }
}

struct FakeSystemManager {
    shared: Rc<Shared>,
}

impl SystemManager for FakeSystemManager {
    fn lookup_tree_item(&self, path: &str) -> Result<Box<dyn TreeItem>, AutomationError> {
        self.shared.record(format!("lookup_tree_item {path}"));
        let node = match path {
            PLC_CONFIGURATION => Node::PlcConfiguration,
            REAL_TIME_TASKS => Node::Tasks,
            _ => return Err(AutomationError::TreeItemNotFound(path.to_string())),
        };
        Ok(Box::new(FakeItem {
            shared: self.shared.clone(),
            node,
        }))
    }

    fn lookup_plc_project(&self, path: &str) -> Result<Box<dyn PlcProject>, AutomationError> {
        self.shared.record(format!("lookup_plc_project {path}"));
        let expected = child_path(PLC_CONFIGURATION, &self.shared.behavior.plc_project_name);
        if path != expected {
            return Err(AutomationError::TreeItemNotFound(path.to_string()));
        }
        Ok(Box::new(FakeItem {
            shared: self.shared.clone(),
            node: Node::PlcProject,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    PlcConfiguration,
    Tasks,
    Task(usize),
    PlcProject,
}

struct FakeItem {
    shared: Rc<Shared>,
    node: Node,
}

impl TreeItem for FakeItem {
    fn name(&self) -> String {
        match self.node {
            Node::PlcConfiguration => String::from(PLC_CONFIGURATION),
            Node::Tasks => String::from(REAL_TIME_TASKS),
            Node::Task(index) => self
                .shared
                .state
                .borrow()
                .tasks
                .get(index)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            Node::PlcProject => self.shared.behavior.plc_project_name.clone(),
        }
    }

    fn child_count(&self) -> usize {
        match self.node {
            Node::PlcConfiguration => self.shared.behavior.plc_project_count,
            Node::Tasks => self.shared.state.borrow().tasks.len(),
            Node::Task(_) | Node::PlcProject => 0,
        }
    }

    fn children(&self) -> Result<Vec<Box<dyn TreeItem>>, AutomationError> {
        let count = match self.node {
            Node::Tasks => self.child_count(),
            _ => 0,
        };
        Ok((0..count)
            .map(|index| {
                Box::new(FakeItem {
                    shared: self.shared.clone(),
                    node: Node::Task(index),
                }) as Box<dyn TreeItem>
            })
            .collect())
    }

    fn produce_xml(&self) -> Result<String, AutomationError> {
        let state = self.shared.state.borrow();
        Ok(match self.node {
            Node::Task(index) => state
                .tasks
                .get(index)
                .map(|(_, xml)| xml.clone())
                .unwrap_or_default(),
            Node::PlcProject => state.plc_project_xml.clone(),
            Node::PlcConfiguration | Node::Tasks => String::from("<TreeItem/>"),
        })
    }

    fn consume_xml(&self, xml: &str) -> Result<(), AutomationError> {
        let name = self.name();
        self.shared.record(format!("consume_xml {name}"));
        let mut state = self.shared.state.borrow_mut();
        match self.node {
            Node::Task(index) => {
                if let Some(task) = state.tasks.get_mut(index) {
                    task.1 = xml.to_string();
                }
            }
            Node::PlcProject => state.plc_project_xml = xml.to_string(),
            Node::PlcConfiguration | Node::Tasks => {}
        }
        Ok(())
    }
}

impl PlcProject for FakeItem {
    fn check_all_objects(&self) -> Result<bool, AutomationError> {
        self.shared.record("check_all_objects");
        if self.shared.behavior.check_fails {
            return Err(self.shared.fail("check_all_objects"));
        }
        Ok(self.shared.behavior.check_all_objects)
    }

    fn save_as_library(&self, path: &Path, install: bool) -> Result<(), AutomationError> {
        self.shared.record("save_as_library");
        if self.shared.behavior.save_fails {
            return Err(self.shared.fail("save_as_library"));
        }
        self.shared.state.borrow_mut().saved_library = Some((path.to_path_buf(), install));
        Ok(())
    }
}
