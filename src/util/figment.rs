use error_stack::{Context, Report};

/// Copies every error figment collected while extracting the
/// configuration onto a report, each with the key and the provider it
/// came from.
pub trait FigmentErrorAttachable<T: Context> {
  fn attach_figment_error(self, err: figment::Error) -> Report<T>;
}

impl<T: Context> FigmentErrorAttachable<T> for Report<T> {
  fn attach_figment_error(self, err: figment::Error) -> Report<T> {
    let mut report = self;
    for error in err {
      let mut message = error.kind.to_string();

      if let (Some(profile), Some(md)) = (&error.profile, &error.metadata) {
        if !error.path.is_empty() {
          let key = md.interpolate(profile, &error.path);
          message.push_str(&format!(" for key {key:?}"));
        }
      }

      if let Some(md) = &error.metadata {
        match &md.source {
          Some(source) => message.push_str(&format!(" in {source} {}", md.name)),
          None => message.push_str(&format!(" in {}", md.name)),
        }
      }

      report = report.attach_printable(message);
    }
    report
  }
}
