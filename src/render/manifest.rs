//! imsmanifest.xml generation.

use super::{ENTRY_PATH, RenderOptions};
use crate::config::ScormVersion;
use crate::model::CourseContent;
use crate::util::escape_attr as escape_xml;

const RESOURCE_ID: &str = "resource-1";

/// Render the manifest listing `files` as the single SCO's resource files.
///
/// The course runs as one SCO: the entry shell drives page navigation, so the
/// organization has a single item.
pub fn render_manifest(content: &CourseContent, files: &[String], options: &RenderOptions) -> String {
    let identifier = content.identifier();
    let org_id = format!("{identifier}-org");
    let title = escape_xml(&content.title);
    let has_assessment = content.assessment().is_some();

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<manifest identifier=\"{}\" version=\"1.0\"",
        escape_xml(&identifier)
    ));
    match options.scorm_version {
        ScormVersion::Scorm12 => xml.push_str(
            r#"
  xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
  xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
"#,
        ),
        ScormVersion::Scorm2004 => xml.push_str(
            r#"
  xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
  xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3"
  xmlns:adlseq="http://www.adlnet.org/xsd/adlseq_v1p3"
  xmlns:adlnav="http://www.adlnet.org/xsd/adlnav_v1p3"
  xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
"#,
        ),
    }

    let schema_version = match options.scorm_version {
        ScormVersion::Scorm12 => "1.2",
        ScormVersion::Scorm2004 => "2004 3rd Edition",
    };
    xml.push_str("  <metadata>\n");
    xml.push_str("    <schema>ADL SCORM</schema>\n");
    xml.push_str(&format!("    <schemaversion>{schema_version}</schemaversion>\n"));
    xml.push_str("  </metadata>\n");

    xml.push_str(&format!("  <organizations default=\"{org_id}\">\n"));
    xml.push_str(&format!("    <organization identifier=\"{org_id}\">\n"));
    xml.push_str(&format!("      <title>{title}</title>\n"));
    xml.push_str(&format!(
        "      <item identifier=\"item-1\" identifierref=\"{RESOURCE_ID}\" isvisible=\"true\">\n"
    ));
    xml.push_str(&format!("        <title>{title}</title>\n"));
    if has_assessment {
        write_mastery(&mut xml, options);
    }
    xml.push_str("      </item>\n");
    xml.push_str("    </organization>\n");
    xml.push_str("  </organizations>\n");

    let scorm_type = match options.scorm_version {
        ScormVersion::Scorm12 => "adlcp:scormtype",
        ScormVersion::Scorm2004 => "adlcp:scormType",
    };
    xml.push_str("  <resources>\n");
    xml.push_str(&format!(
        "    <resource identifier=\"{RESOURCE_ID}\" type=\"webcontent\" {scorm_type}=\"sco\" href=\"{ENTRY_PATH}\">\n"
    ));
    for file in files {
        xml.push_str(&format!("      <file href=\"{}\"/>\n", escape_xml(file)));
    }
    xml.push_str("    </resource>\n");
    xml.push_str("  </resources>\n");
    xml.push_str("</manifest>\n");
    xml
}

/// Pass requirement for hosts that evaluate it themselves.
fn write_mastery(xml: &mut String, options: &RenderOptions) {
    match options.scorm_version {
        ScormVersion::Scorm12 => {
            xml.push_str(&format!(
                "        <adlcp:masteryscore>{}</adlcp:masteryscore>\n",
                options.pass_mark
            ));
        }
        ScormVersion::Scorm2004 => {
            let measure = f64::from(options.pass_mark) / 100.0;
            xml.push_str("        <imsss:sequencing>\n");
            xml.push_str("          <imsss:objectives>\n");
            xml.push_str(
                "            <imsss:primaryObjective objectiveID=\"PRIMARYOBJ\" satisfiedByMeasure=\"true\">\n",
            );
            xml.push_str(&format!(
                "              <imsss:minNormalizedMeasure>{measure:.2}</imsss:minNormalizedMeasure>\n"
            ));
            xml.push_str("            </imsss:primaryObjective>\n");
            xml.push_str("          </imsss:objectives>\n");
            xml.push_str("        </imsss:sequencing>\n");
        }
    }
}
