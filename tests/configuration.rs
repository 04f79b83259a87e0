use nucdisk::configuration::config::{
    CollisionConfig, ConfigError, GravityConfig, IntegratorConfig, OrientationConfig, RunConfig, RunMode,
};

const ARCHIVE_INI: &str = "
[DEFAULT]
e = 0.5

[params]
name = disk
pRun = 10
pOut = 0.4
keep_bins = True
gravity = tree
integrator = leapfrog
dt = 0.001
coll = direct
seed = 12

[light]
N = 1000
a_min = 1
a_max = 2

[heavy]
N = 50.
m = 5e-4
e = 0.3
i_max = 10
";

#[test]
fn archive_ini_is_resolved() {
    let cfg = RunConfig::from_ini_str(ARCHIVE_INI, RunMode::Archive).unwrap();
    let p = &cfg.params;

    assert_eq!(p.name, "disk");
    assert_eq!(p.p_run, 10.0);
    assert_eq!(p.p_out, 0.4);
    assert!(p.keep_bins);
    assert_eq!(p.gravity, GravityConfig::Tree);
    assert_eq!(p.integrator, IntegratorConfig::Leapfrog);
    assert_eq!(p.coll, CollisionConfig::Direct);
    assert_eq!(p.dt, 0.001);
    assert_eq!(p.seed, Some(12));
    assert_eq!(p.prune_max_rounds, None);
    assert_eq!(p.buffer, 1.0);
    assert_eq!(p.rt, 1e-4);

    assert_eq!(cfg.sections.len(), 2);
    let light = &cfg.sections[0];
    assert_eq!(light.name, "light");
    assert_eq!(light.n, 1000);
    assert_eq!(light.e, 0.5); // from [DEFAULT]
    assert_eq!(light.m, 5e-5);
    assert_eq!(light.p, 2.0);
    assert_eq!(light.orientation, OrientationConfig::Inclined { i_max: 5.0 });

    let heavy = &cfg.sections[1];
    assert_eq!(heavy.n, 50);
    assert_eq!(heavy.e, 0.3);
    assert_eq!(heavy.orientation, OrientationConfig::Inclined { i_max: 10.0 });
}

#[test]
fn series_defaults_differ_from_archive() {
    let text = "[params]\n[stars]\nN = 10\n";
    let series = RunConfig::from_ini_str(text, RunMode::Series).unwrap();
    let archive = RunConfig::from_ini_str(text, RunMode::Archive).unwrap();

    assert_eq!(series.params.p_out, 10.0);
    assert_eq!(series.params.p_save, 50);
    assert_eq!(series.sections[0].p, 1.0);
    assert_eq!(series.sections[0].orientation, OrientationConfig::Disk { ang: 2.0 });

    assert_eq!(archive.params.p_out, 0.2);
    assert_eq!(archive.sections[0].p, 2.0);
    assert_eq!(archive.params.p_run, 500.0);
    assert_eq!(archive.params.gravity, GravityConfig::Basic);
    assert_eq!(archive.params.coll, CollisionConfig::Line);
}

#[test]
fn explicit_ang_selects_the_disk_law_in_archive_mode() {
    let text = "[params]\n[stars]\nang = 3\n";
    let cfg = RunConfig::from_ini_str(text, RunMode::Archive).unwrap();
    assert_eq!(cfg.sections[0].orientation, OrientationConfig::Disk { ang: 3.0 });
}

#[test]
fn yaml_matches_ini() {
    let yaml = "
params:
  name: disk
  pRun: 10
  gravity: tree
  prune_max_rounds: 25
light:
  N: 100
  m: 5.0e-5
";
    let cfg = RunConfig::from_yaml_str(yaml, RunMode::Archive).unwrap();
    assert_eq!(cfg.params.name, "disk");
    assert_eq!(cfg.params.gravity, GravityConfig::Tree);
    assert_eq!(cfg.params.prune_max_rounds, Some(25));
    assert_eq!(cfg.sections.len(), 1);
    assert_eq!(cfg.sections[0].n, 100);
    assert_eq!(cfg.sections[0].m, 5e-5);
}

#[test]
fn load_picks_the_format_from_the_extension() {
    let dir = tempfile::tempdir().unwrap();
    let ini = dir.path().join("config");
    let yaml = dir.path().join("config.yaml");
    std::fs::write(&ini, "[params]\npRun = 3\n[a]\nN = 5\n").unwrap();
    std::fs::write(&yaml, "params:\n  pRun: 4\na:\n  N: 6\n").unwrap();

    assert_eq!(RunConfig::load(&ini, RunMode::Archive).unwrap().params.p_run, 3.0);
    assert_eq!(RunConfig::load(&yaml, RunMode::Archive).unwrap().sections[0].n, 6);
}

#[test]
fn missing_params_section_is_an_error() {
    let err = RunConfig::from_ini_str("[stars]\nN = 10\n", RunMode::Archive).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSection(ref s) if s == "params"));
}

#[test]
fn bad_values_are_reported_with_their_key() {
    let cases = [
        ("[params]\ngravity = fmm\n", "gravity"),
        ("[params]\npRun = -1\n", "prun"),
        ("[params]\n[s]\nN = 2.5\n", "n"),
        ("[params]\n[s]\ne = 1.2\n", "e"),
        ("[params]\n[s]\na_min = 3\na_max = 2\n", "a_max"),
        ("[params]\nkeep_bins = maybe\n", "keep_bins"),
    ];
    for (text, bad_key) in cases {
        match RunConfig::from_ini_str(text, RunMode::Archive) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, bad_key, "{text}"),
            other => panic!("{text}: expected an invalid value, got {other:?}"),
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = RunConfig::load(std::path::Path::new("/nonexistent/config"), RunMode::Archive).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
