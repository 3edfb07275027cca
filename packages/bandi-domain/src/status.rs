/// Record lifecycle state. The textual form is the storage representation;
/// parsing is the only way back, so in-memory code never compares against raw
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
	New,
	Analyzed,
	Error,
}
impl RecordStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::New => "new",
			Self::Analyzed => "analyzed",
			Self::Error => "error",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"new" => Some(Self::New),
			"analyzed" => Some(Self::Analyzed),
			"error" => Some(Self::Error),
			_ => None,
		}
	}

	/// Transition matrix. Nothing ever returns to `New`; `Analyzed` never
	/// regresses.
	pub fn permits(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::New, Self::Analyzed)
				| (Self::New, Self::Error)
				| (Self::Error, Self::Analyzed)
				| (Self::Error, Self::Error)
				| (Self::Analyzed, Self::Analyzed)
		)
	}

	/// State after a successful enrichment + merge. Permitted from every
	/// state.
	pub fn on_success(self) -> Self {
		Self::Analyzed
	}

	/// State after retry/provider exhaustion. A failed forced re-drive of an
	/// analyzed record keeps its state.
	pub fn on_failure(self) -> Self {
		if self.permits(Self::Error) { Self::Error } else { self }
	}
}
