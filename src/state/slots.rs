use crate::capture::normalize::EncodedImage;

/// Identity of one of the two image holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    /// The reference answer (optional).
    Reference,
    /// The student's answer (required for submission).
    Student,
}

impl SlotId {
    pub fn label(self) -> &'static str {
        match self {
            SlotId::Reference => "Reference Answer",
            SlotId::Student => "Student Answer",
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::Reference => write!(f, "reference"),
            SlotId::Student => write!(f, "student"),
        }
    }
}

/// One named image holder. Holds the normalized image, or nothing.
#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    image: Option<EncodedImage>,
}

impl ImageSlot {
    /// Store a newly acquired image, replacing any previous one.
    pub fn store(&mut self, image: EncodedImage) {
        self.image = Some(image);
    }

    pub fn clear(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// The two slots, addressed by `SlotId`.
#[derive(Debug, Clone, Default)]
pub struct SlotPair {
    reference: ImageSlot,
    student: ImageSlot,
}

impl SlotPair {
    pub fn get(&self, id: SlotId) -> &ImageSlot {
        match id {
            SlotId::Reference => &self.reference,
            SlotId::Student => &self.student,
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> &mut ImageSlot {
        match id {
            SlotId::Reference => &mut self.reference,
            SlotId::Student => &mut self.student,
        }
    }

    /// Submission is possible exactly when the student slot is filled.
    /// The reference slot is optional.
    pub fn ready_to_submit(&self) -> bool {
        self.student.has_image()
    }
}
