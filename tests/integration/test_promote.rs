//! `ckrail charm promote` against a fake `charm` executable

#![cfg(unix)]

use crate::helpers::*;
use anyhow::Result;

const CHARMS: &str = r#"
- flannel:
    namespace: containers
    downstream: charmed-kubernetes/charm-flannel
    tags: [k8s, flannel]
- calico:
    namespace: containers
    downstream: charmed-kubernetes/charm-calico
    tags: [calico]
"#;

fn promote(ws: &TestWorkspace, extra: &[&str]) -> Result<std::process::Output> {
  let bin = install_fake_charm(ws)?;
  let list = ws.write_list("charms.yaml", CHARMS)?;
  let list = list.to_string_lossy().to_string();
  let workspace = ws.workspace().to_string_lossy().to_string();
  let path = path_with(&bin);

  let mut args = vec![
    "charm",
    "promote",
    "--charm-list",
    list.as_str(),
    "--from-channel",
    "edge",
    "--to-channel",
    "beta",
    "--filter-by-tag",
    "k8s",
  ];
  args.extend_from_slice(extra);
  run_ckrail(&ws.root, &args, &[("WORKSPACE", workspace.as_str()), ("PATH", path.as_str())])
}

#[test]
fn test_promote_replays_edge_resources_at_beta() -> Result<()> {
  let ws = TestWorkspace::new()?;
  expect_success(&promote(&ws, &[])?)?;

  let calls = charm_calls(&ws)?;
  assert_eq!(
    calls,
    vec![
      "show cs:~containers/flannel --channel edge id",
      "list-resources cs:~containers/flannel-12 --channel edge --format yaml",
      "release cs:~containers/flannel-12 --channel beta --resource flannel-amd64-3",
    ]
  );
  Ok(())
}

#[test]
fn test_promote_dry_run_prints_plan_without_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let stdout = expect_success(&promote(&ws, &["--dry-run", "--json"])?)?;

  let plans: serde_json::Value = serde_json::from_str(&stdout)?;
  assert_eq!(plans[0]["id"], "cs:~containers/flannel-12");
  assert_eq!(plans[0]["resources"][0]["name"], "flannel-amd64");
  assert_eq!(plans[0]["resources"][0]["revision"], 3);
  assert!(
    charm_calls(&ws)?.iter().all(|c| !c.starts_with("release")),
    "dry run must not release"
  );
  Ok(())
}
