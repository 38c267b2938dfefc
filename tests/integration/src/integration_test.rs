//! End-to-end integration test for the library stack
//!
//! These tests exercise the complete flow without the binary: config loading ->
//! discovery -> binding -> command execution, plus an isolated boundary served
//! in-process over the line protocol.

use pretty_assertions::assert_eq;
use std::io::Cursor;
use vsix_core::{
    AssemblyProbe, BindingRedirect, BufferConsole, CommandOutcome, CommandRequest, DirectoryCatalog,
    HostVersion, ListedExtension, ModuleLoader, ProbeConfig, ToolConfig, VersionCatalog,
    VersionFilter,
};
use vsix_extensions::{ExtensionManager, LocalExtensionManager, SettingsStore, execute};
use vsix_isolation::protocol::{BoundaryEvent, BoundaryRequest, read_message, write_message};
use vsix_isolation::{Dispatcher, ToolEnvironment, serve_boundary};
use vsix_test_utils::{FakeHost, VsixBuilder};

fn sample_package(host: &FakeHost) -> String {
    VsixBuilder::new("Sample.Extension")
        .name("Sample Extension")
        .version("3.0")
        .file("Sample.dll", b"payload")
        .write(host.root(), "sample.vsix")
        .to_string_lossy()
        .into_owned()
}

fn environment(host: &FakeHost) -> ToolEnvironment {
    // Never started: these tests only use shared execution.
    ToolEnvironment::new(host.root().join("vsixutil"), host.root(), host.settings_root())
}

#[test]
fn test_config_drives_discovery_and_selection() {
    let host = FakeHost::new();
    host.add_legacy(HostVersion::Vs2010);
    host.add_legacy(HostVersion::Vs2015);
    host.add_sku("Enterprise");
    host.add_sku("Community");

    let config = ToolConfig::load(&host.write_config()).unwrap();
    let discovered = DirectoryCatalog::from_config(&config)
        .installed_versions()
        .unwrap();

    let labels: Vec<String> = discovered.iter().map(ToString::to_string).collect();
    assert_eq!(
        labels,
        vec!["Vs2010", "Vs2015", "Vs2017 Community", "Vs2017 Enterprise"]
    );

    let selected = VersionFilter::new(Some("15".to_string()), Some("ent".to_string())).apply(discovered);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].product(), Some("Enterprise"));
}

#[test]
fn test_shared_install_across_versions() {
    let host = FakeHost::new();
    host.add_legacy(HostVersion::Vs2010);
    host.add_legacy(HostVersion::Vs2015);
    host.add_sku("Community");
    let package = sample_package(&host);

    let config = ToolConfig::load(&host.write_config()).unwrap();
    let versions = DirectoryCatalog::from_config(&config)
        .installed_versions()
        .unwrap();
    let env = environment(&host);
    let mut console = BufferConsole::new();

    let report = Dispatcher::new(&env).with_default_domain(true).run(
        &versions,
        &CommandRequest::install(package),
        &mut console,
    );

    // Without a redirect only the oldest and newest versions can bind.
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].installed.version(), HostVersion::Vs2015);
    assert!(
        report.failures[0]
            .message
            .starts_with("no extension manager binding for Vs2015")
    );
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|(_, outcome)| outcome.succeeded()));

    let output = console.contents();
    assert!(output.contains("Vs2010 Install ... Succeeded"));
    assert!(output.contains("Vs2017 Install ... Succeeded"));

    for version in [HostVersion::Vs2010, HostVersion::Vs2017] {
        let index = host.extensions_dir(version, "").join("extensions.json");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(index).unwrap()).unwrap();
        assert_eq!(
            json["extensions"][0]["header"]["identifier"],
            "Sample.Extension"
        );
        assert_eq!(json["extensions"][0]["enabled"], true);
    }
}

#[test]
fn test_isolated_boundary_served_in_process() {
    let host = FakeHost::new();
    let installed = host.add_legacy(HostVersion::Vs2015);
    let package = sample_package(&host);
    let redirect = BindingRedirect::for_version(HostVersion::Vs2015)
        .unwrap()
        .write_temporary()
        .unwrap();

    let run = |request: CommandRequest| BoundaryRequest::Run {
        installed: installed.clone(),
        probe: ProbeConfig::for_installation(&installed),
        settings_root: host.settings_root(),
        request,
    };
    let mut input = Vec::new();
    write_message(&mut input, &run(CommandRequest::install(package))).unwrap();
    write_message(&mut input, &run(CommandRequest::list(Some("^sample".to_string())))).unwrap();
    write_message(&mut input, &BoundaryRequest::Shutdown).unwrap();

    let mut output = Vec::new();
    serve_boundary(Some(redirect.as_path()), host.root(), Cursor::new(input), &mut output).unwrap();
    std::fs::remove_file(&redirect).unwrap();

    let mut reader = Cursor::new(output);
    let mut outcomes = Vec::new();
    let mut text = String::new();
    while let Some(event) = read_message::<BoundaryEvent>(&mut reader).unwrap() {
        match event {
            BoundaryEvent::Write { text: t } => text.push_str(&t),
            BoundaryEvent::WriteLine { text: t } => {
                text.push_str(&t);
                text.push('\n');
            }
            BoundaryEvent::Completed { outcome } => outcomes.push(outcome),
            BoundaryEvent::Failed { message } => panic!("boundary failed: {message}"),
        }
    }

    assert!(text.starts_with("Vs2015 Install ... Succeeded\n"));
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].succeeded());
    assert_eq!(
        outcomes[1],
        CommandOutcome::Listed {
            extensions: vec![ListedExtension {
                name: "Sample Extension".to_string(),
                identifier: "Sample.Extension".to_string(),
            }],
        }
    );

    // The boundary wrote through the same store the parent would open.
    let store = SettingsStore::create_for_application(
        &host.settings_root(),
        HostVersion::Vs2015,
        &installed.application_path().to_string_lossy(),
        "",
    );
    let manager = LocalExtensionManager::new(store, true);
    let listed = manager.list_installed().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].install_path.join("Sample.dll").is_file());
}

#[test]
fn test_root_suffix_keeps_hives_apart() {
    let host = FakeHost::new();
    let installed = host.add_sku("Community");
    let package = sample_package(&host);
    let loader = ModuleLoader::new(
        AssemblyProbe::new(ProbeConfig::for_installation(&installed)),
        host.root(),
    );

    let mut console = BufferConsole::new();
    let outcome = execute(
        &loader,
        &host.settings_root(),
        &installed,
        &CommandRequest::install(package).with_root_suffix("Exp"),
        &mut console,
    )
    .unwrap();
    assert!(outcome.succeeded());

    let listed = execute(
        &loader,
        &host.settings_root(),
        &installed,
        &CommandRequest::list(None),
        &mut console,
    )
    .unwrap();
    assert_eq!(listed, CommandOutcome::Listed { extensions: Vec::new() });

    let experimental = execute(
        &loader,
        &host.settings_root(),
        &installed,
        &CommandRequest::list(None).with_root_suffix("Exp"),
        &mut console,
    )
    .unwrap();
    match experimental {
        CommandOutcome::Listed { extensions } => assert_eq!(extensions.len(), 1),
        other => panic!("expected a listing, got {other:?}"),
    }
}
