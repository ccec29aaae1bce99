//! Shared fixtures for pipeline integration tests

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A release workflow: start, two sequential tasks, a decision with a
/// remediation branch, and an end marker.
pub const RELEASE_FLOWCHART: &str = r#"
<mxfile>
  <diagram name="release">
    <mxGraphModel>
      <root>
        <mxCell id="0" />
        <mxCell id="1" parent="0" />
        <mxCell id="s" value="Start" style="ellipse" vertex="1" parent="1">
          <mxGeometry x="100" y="0" width="120" height="40" />
        </mxCell>
        <mxCell id="a" value="Configure database [out:config/db.yml]" style="rounded=0" vertex="1" parent="1">
          <mxGeometry x="100" y="100" width="120" height="40" />
        </mxCell>
        <mxCell id="b" value="Write unit tests" style="rounded=0" vertex="1" parent="1">
          <mxGeometry x="100" y="200" width="120" height="40" />
        </mxCell>
        <mxCell id="d" value="Tests pass?" style="rhombus" vertex="1" parent="1">
          <mxGeometry x="100" y="300" width="120" height="40" />
        </mxCell>
        <mxCell id="f" value="Investigate failures" style="rounded=0" vertex="1" parent="1">
          <mxGeometry x="300" y="300" width="120" height="40" />
        </mxCell>
        <mxCell id="e" value="Done" style="ellipse" vertex="1" parent="1">
          <mxGeometry x="100" y="400" width="120" height="40" />
        </mxCell>
        <mxCell id="e1" edge="1" source="s" target="a" parent="1" />
        <mxCell id="e2" edge="1" source="a" target="b" parent="1" />
        <mxCell id="e3" edge="1" source="b" target="d" parent="1" />
        <mxCell id="e4" value="Yes" edge="1" source="d" target="e" parent="1" />
        <mxCell id="e5" value="No" edge="1" source="d" target="f" parent="1" />
        <mxCell id="e6" edge="1" source="f" target="e" parent="1" />
      </root>
    </mxGraphModel>
  </diagram>
</mxfile>
"#;

/// Write flowchart XML into a temp directory and return the file path.
pub fn write_flowchart(dir: &TempDir, file_name: &str, xml: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    fs::write(&path, xml).expect("Failed to write flowchart fixture");
    path
}
