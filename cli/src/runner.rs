//! The export sequence.
//!
//! A run is a fixed list of steps. Each step either succeeds or fails with
//! the [`Outcome`] that names the failure; nothing is retried. The IDE
//! session and the message filter are held by guards, so they are released
//! on every path out of the sequence.

use std::{fmt, path::Path, sync::Arc};

use log::{debug, error, info, warn};
use tcexport_automation::{
    tree::{child_path, PLC_CONFIGURATION, REAL_TIME_TASKS},
    AutomationHost, BuildSummary, FilterGuard, IdeSession, MessageFilter, PlcProject,
    SessionGuard, SessionRequest, SystemManager, VersionSelection,
};
use tcexport_problems::Outcome;
use tcexport_project::{tree_item, ProjectError, Solution, TwinCatProject};
use thiserror::Error;

use crate::{config::RunConfig, supervisor::Supervisor};

/// A failed step of the sequence.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    pub outcome: Outcome,
    pub message: String,
}

impl StepError {
    pub fn new(outcome: Outcome, message: impl Into<String>) -> Self {
        StepError {
            outcome,
            message: message.into(),
        }
    }
}

/// Returns a function that turns an error into a failed step.
fn fail<'a, E: fmt::Display>(
    outcome: Outcome,
    context: &'a str,
) -> impl FnOnce(E) -> StepError + 'a {
    move |err| StepError::new(outcome, format!("{context}. {err}"))
}

/// Runs the export and returns its outcome.
///
/// The session and filter are registered with `supervisor` while they are
/// held, so that a timeout or an interrupt can release them from another
/// thread.
pub fn run(
    config: &RunConfig,
    host: &dyn AutomationHost,
    filter: Arc<dyn MessageFilter>,
    supervisor: &Supervisor,
) -> Outcome {
    let outcome = match execute(config, host, filter, supervisor) {
        Ok(()) => {
            info!("Library saved to {}", config.library.display());
            Outcome::Success
        }
        Err(err) => {
            error!("{err}");
            err.outcome
        }
    };
    info!("{outcome}");
    info!("Exiting application...");
    outcome
}

fn execute(
    config: &RunConfig,
    host: &dyn AutomationHost,
    filter: Arc<dyn MessageFilter>,
    supervisor: &Supervisor,
) -> Result<(), StepError> {
    let solution_path = validate_input(config)?;

    info!("tcexport {}", env!("CARGO_PKG_VERSION"));
    info!("Solution: {}", solution_path.display());
    info!("PLC project: {}", config.plc_project);
    info!("Library: {}", config.library.display());

    let _filter = FilterGuard::install(filter.clone()).map_err(fail(
        Outcome::SessionLoadError,
        "Unable to install the message filter",
    ))?;
    supervisor.register_filter(filter);

    let solution = Solution::read(solution_path).map_err(|err| {
        StepError::new(
            Outcome::ProjectFileNotFound,
            format!("Unable to read the solution. {err}"),
        )
    })?;
    let project = resolve_project(&solution)?;
    let selection = select_version(&project, config.tc_version.as_deref())?;

    let request = SessionRequest {
        solution: solution_path.to_path_buf(),
        dte_version: solution.dte_version(),
        tc_version: selection,
    };
    let session = host.open(&request).map_err(fail(
        Outcome::SessionLoadError,
        "Unable to open the Visual Studio automation session",
    ))?;
    let mut session = SessionGuard::new(session);
    supervisor.register_session(session.killer());

    session
        .load_solution(solution_path)
        .map_err(fail(Outcome::SolutionLoadError, "Unable to load the solution"))?;

    let Some(visual_studio_version) = solution.visual_studio_version() else {
        return Err(StepError::new(
            Outcome::VersionDetectionError,
            format!(
                "No Visual Studio version in solution {}",
                solution_path.display()
            ),
        ));
    };
    info!("Visual Studio version: {visual_studio_version}");

    let system_manager = session.system_manager().map_err(fail(
        Outcome::SolutionLoadError,
        "Unable to access the TwinCAT System Manager",
    ))?;
    let plc_project = find_plc_project(system_manager.as_ref(), &config.plc_project)?;
    log_ams_port(plc_project.as_ref());

    if let Some(task) = &config.task {
        configure_tasks(system_manager.as_ref(), task)?;
    }
    apply_compiler_defines(plc_project.as_ref(), &config.defines)?;

    build(&mut *session)?;
    check_all_objects(plc_project.as_ref())?;

    plc_project
        .save_as_library(&config.library, false)
        .map_err(fail(
            Outcome::LibraryExportError,
            "Unable to save the PLC project as a library",
        ))?;

    drop(plc_project);
    drop(system_manager);
    if let Err(err) = session.close() {
        warn!("Unable to close the Visual Studio session. {err}");
    }
    Ok(())
}

/// Checks that a solution was given and exists.
fn validate_input(config: &RunConfig) -> Result<&Path, StepError> {
    let path = config
        .solution
        .as_deref()
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| {
            StepError::new(
                Outcome::SolutionPathNotProvided,
                "No Visual Studio solution given",
            )
        })?;

    if !path.is_file() {
        return Err(StepError::new(
            Outcome::SolutionPathNotFound,
            format!("Solution {} does not exist", path.display()),
        ));
    }
    Ok(path)
}

/// Finds and reads the TwinCAT project of the solution.
fn resolve_project(solution: &Solution) -> Result<TwinCatProject, StepError> {
    let Some(path) = solution.twincat_project() else {
        return Err(StepError::new(
            Outcome::ProjectFileNotFound,
            format!(
                "No TwinCAT project in solution {}",
                solution.path().display()
            ),
        ));
    };
    if !path.is_file() {
        return Err(StepError::new(
            Outcome::ProjectFileNotFound,
            format!("TwinCAT project {} does not exist", path.display()),
        ));
    }
    info!("TwinCAT project: {}", path.display());

    TwinCatProject::read(&path).map_err(|err| match err {
        ProjectError::Io { .. } => StepError::new(Outcome::ProjectFileNotFound, err.to_string()),
        ProjectError::Xml { .. } => StepError::new(Outcome::VersionNotFound, err.to_string()),
    })
}

fn select_version(
    project: &TwinCatProject,
    forced: Option<&str>,
) -> Result<VersionSelection, StepError> {
    let Some(version) = project.version() else {
        return Err(StepError::new(
            Outcome::VersionNotFound,
            format!("No TcVersion in {}", project.path().display()),
        ));
    };
    info!("TwinCAT project version: {version}");
    info!("TwinCAT project pinned: {}", project.is_pinned());

    let selection = VersionSelection::select(version, project.is_pinned(), forced);
    info!("Using TwinCAT {selection}");
    Ok(selection)
}

/// Looks up the PLC project, checking first that the PLC configuration has
/// any project at all.
fn find_plc_project(
    system_manager: &dyn SystemManager,
    name: &str,
) -> Result<Box<dyn PlcProject>, StepError> {
    let configuration = system_manager
        .lookup_tree_item(PLC_CONFIGURATION)
        .map_err(fail(
            Outcome::NoPlcProject,
            "Unable to read the PLC configuration",
        ))?;
    if configuration.child_count() == 0 {
        return Err(StepError::new(
            Outcome::NoPlcProject,
            "The TwinCAT project has no PLC project",
        ));
    }

    let path = child_path(PLC_CONFIGURATION, name);
    debug!("Looking up PLC project {path}");
    system_manager
        .lookup_plc_project(&path)
        .map_err(fail(Outcome::NoPlcProject, "Unable to find the PLC project"))
}

fn log_ams_port(plc_project: &dyn PlcProject) {
    let port = plc_project
        .produce_xml()
        .map_err(|err| err.to_string())
        .and_then(|xml| tree_item::ams_port(&xml).map_err(|err| err.to_string()));
    match port {
        Ok(Some(port)) => info!("AMS port: {port}"),
        Ok(None) => debug!("PLC project has no AMS port"),
        Err(err) => warn!("Unable to read the AMS port. {err}"),
    }
}

/// Enables the task named `enabled` and disables every other real-time
/// task.
///
/// Every task document is updated in memory before any is written back, so
/// a failure leaves the configuration untouched. A task other than
/// `enabled` that has no flags to set is skipped.
fn configure_tasks(system_manager: &dyn SystemManager, enabled: &str) -> Result<(), StepError> {
    let tasks = system_manager
        .lookup_tree_item(REAL_TIME_TASKS)
        .and_then(|node| node.children())
        .map_err(fail(
            Outcome::ConfigurationError,
            "Unable to read the real-time tasks",
        ))?;

    if !tasks.iter().any(|task| task.name() == enabled) {
        return Err(StepError::new(
            Outcome::ConfigurationError,
            format!("Real-time task '{enabled}' not found"),
        ));
    }

    let mut updates = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let name = task.name();
        let enable = name == enabled;
        let xml = task.produce_xml().map_err(fail(
            Outcome::ConfigurationError,
            "Unable to read a real-time task",
        ))?;
        let updated = tree_item::set_disabled_and_autostart(&xml, !enable, enable).map_err(
            fail(
                Outcome::ConfigurationError,
                "Unable to update a real-time task",
            ),
        )?;

        match updated {
            Some(updated) => updates.push((task, name, enable, updated)),
            None if enable => {
                return Err(StepError::new(
                    Outcome::ConfigurationError,
                    format!("Real-time task '{name}' has no Disabled or AutoStart setting"),
                ))
            }
            None => warn!("Real-time task '{name}' has no Disabled or AutoStart setting, skipped"),
        }
    }

    for (task, name, enable, updated) in updates {
        task.consume_xml(&updated).map_err(fail(
            Outcome::ConfigurationError,
            "Unable to write a real-time task",
        ))?;

        if enable {
            info!("Enabled real-time task {name}");
        } else {
            debug!("Disabled real-time task {name}");
        }
    }
    Ok(())
}

fn apply_compiler_defines(
    plc_project: &dyn PlcProject,
    defines: &[String],
) -> Result<(), StepError> {
    if defines.is_empty() {
        return Ok(());
    }

    let mut xml = plc_project.produce_xml().map_err(fail(
        Outcome::ConfigurationError,
        "Unable to read the PLC project",
    ))?;
    for define in defines {
        xml = tree_item::add_compiler_define(&xml, define)
            .map_err(fail(
                Outcome::ConfigurationError,
                "Unable to add a compiler define",
            ))?
            .ok_or_else(|| {
                StepError::new(
                    Outcome::ConfigurationError,
                    "The PLC project has no project definition for compiler defines",
                )
            })?;
        info!("Compiler define: {define}");
    }

    plc_project.consume_xml(&xml).map_err(fail(
        Outcome::ConfigurationError,
        "Unable to write the PLC project",
    ))
}

/// Cleans and builds the solution, then fails if the error list has any
/// errors.
fn build(session: &mut dyn IdeSession) -> Result<(), StepError> {
    info!("Cleaning solution");
    session
        .clean_solution()
        .map_err(fail(Outcome::BuildError, "Unable to clean the solution"))?;
    info!("Building solution");
    session
        .build_solution()
        .map_err(fail(Outcome::BuildError, "Unable to build the solution"))?;

    let items = session
        .error_items()
        .map_err(fail(Outcome::BuildError, "Unable to read the error list"))?;
    let summary = BuildSummary::classify(&items);

    if summary.warnings > 0 {
        warn!("Build finished with {} warning(s)", summary.warnings);
    }
    for item in &summary.errors {
        error!(
            "{} (level {}, file {})",
            item.description, item.level, item.file_name
        );
    }
    if summary.has_errors() {
        return Err(StepError::new(
            Outcome::BuildError,
            format!("Build finished with {} error(s)", summary.errors.len()),
        ));
    }
    Ok(())
}

fn check_all_objects(plc_project: &dyn PlcProject) -> Result<(), StepError> {
    info!("Checking all objects");
    match plc_project.check_all_objects() {
        Ok(true) => Ok(()),
        Ok(false) => Err(StepError::new(
            Outcome::CheckObjectsError,
            "Check all objects found errors",
        )),
        Err(err) => Err(StepError::new(
            Outcome::CheckObjectsError,
            format!("Unable to check all objects. {err}"),
        )),
    }
}
