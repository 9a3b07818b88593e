use serde::{Deserialize, Serialize};

/// The fixed set of symptoms the extractor recognises, in reporting order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    Cough,
    Headache,
    SoreThroat,
    RunnyNose,
    Fatigue,
    BodyAche,
    Nausea,
    Diarrhea,
    ShortnessOfBreath,
}

impl Symptom {
    pub const ALL: [Symptom; 10] = [
        Symptom::Fever,
        Symptom::Cough,
        Symptom::Headache,
        Symptom::SoreThroat,
        Symptom::RunnyNose,
        Symptom::Fatigue,
        Symptom::BodyAche,
        Symptom::Nausea,
        Symptom::Diarrhea,
        Symptom::ShortnessOfBreath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symptom::Fever => "fever",
            Symptom::Cough => "cough",
            Symptom::Headache => "headache",
            Symptom::SoreThroat => "sore throat",
            Symptom::RunnyNose => "runny nose",
            Symptom::Fatigue => "fatigue",
            Symptom::BodyAche => "body ache",
            Symptom::Nausea => "nausea",
            Symptom::Diarrhea => "diarrhea",
            Symptom::ShortnessOfBreath => "shortness of breath",
        }
    }

    /// Phrases that count as a mention of this symptom.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Symptom::Fever => &["fever", "temperature", "hot", "chills"],
            Symptom::Cough => &["cough", "coughing", "dry cough", "wet cough"],
            Symptom::Headache => &["headache", "head pain", "migraine"],
            Symptom::SoreThroat => &["sore throat", "throat pain", "difficulty swallowing"],
            Symptom::RunnyNose => &["runny nose", "nasal congestion", "stuffy nose"],
            Symptom::Fatigue => &["fatigue", "tired", "exhausted", "low energy"],
            Symptom::BodyAche => &["body ache", "muscle pain", "joint pain"],
            Symptom::Nausea => &["nausea", "vomiting", "sick to stomach"],
            Symptom::Diarrhea => &["diarrhea", "loose stool"],
            Symptom::ShortnessOfBreath => &[
                "shortness of breath",
                "difficulty breathing",
                "breathless",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Moderate,
    Mild,
}

/// One symptom inferred from a transcript. Serialised with the label the
/// backend's analysis endpoint expects in `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomObservation {
    #[serde(with = "symptom_label")]
    pub name: Symptom,
    pub severity: Option<Severity>,
    pub duration: Option<String>,
    pub context: String,
}

mod symptom_label {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Symptom;

    pub fn serialize<S: Serializer>(symptom: &Symptom, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(symptom.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Symptom, D::Error> {
        let label = String::deserialize(d)?;
        Symptom::ALL
            .into_iter()
            .find(|s| s.as_str() == label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown symptom: {label}")))
    }
}
