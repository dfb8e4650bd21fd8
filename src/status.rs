//! Status codes and localized messages
//!
//! The code values are stable wire constants: negative codes are schema
//! defects discovered while interpreting a descriptor, zero is idle, the
//! positive bands cover shape, type, range and reference findings, and codes
//! at one hundred and above are infrastructure failures.

use serde::{Deserialize, Serialize};

/// Symbolic status constants with stable integer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    // Schema defects
    InvalidDataKindOption = -4,
    NotArrayDataKind = -3,
    RangeNotAnObject = -2,
    ExpectingDataDimension = -1,

    // Idle
    Ok = 0,

    // Shape
    NotAnObject = 1,
    NotAnArray = 2,
    EmptyObject = 3,
    UnknownTerm = 4,
    NotDescriptor = 5,
    NotScalar = 6,

    // Type
    MissingScalarType = 7,
    NotBoolean = 8,
    NotInteger = 9,
    NotNumber = 10,

    // Range and format
    ValueLowRange = 11,
    ValueHighRange = 12,
    ValueOutOfRange = 13,
    NotTimestamp = 14,
    Unsupported = 15,
    NotString = 16,
    NoMatchRegexp = 17,

    // References and enumeration graph
    EmptyKey = 18,
    NotEnum = 19,
    NotStructureDefinition = 20,
    NoRefDefaultNamespace = 21,
    UnknownDocument = 22,
    BadKeyValue = 23,
    BadHandleValue = 24,
    BadCollectionName = 25,
    UnknownCollection = 26,
    NotCorrectEnumType = 27,
    DuplicateSetEntry = 28,

    // Infrastructure
    StoreFailure = 100,
    Cancelled = 101,
}

impl StatusCode {
    /// Stable integer value of the code.
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Message text in the requested language, falling back to the default.
    pub fn message(self, language: &str) -> &'static str {
        match language {
            "it" => self.message_it(),
            _ => self.message_en(),
        }
    }

    fn message_en(self) -> &'static str {
        use StatusCode::*;
        match self {
            InvalidDataKindOption => "Invalid data kind option.",
            NotArrayDataKind => "The data kind is not a list.",
            RangeNotAnObject => "The valid range is not an object.",
            ExpectingDataDimension => "Expecting exactly one data dimension.",
            Ok => "Idle.",
            NotAnObject => "The value is not an object.",
            NotAnArray => "The value is not an array.",
            EmptyObject => "The object is empty.",
            UnknownTerm => "The reference does not resolve to a known term.",
            NotDescriptor => "The term is not a descriptor.",
            NotScalar => "The value is not a scalar.",
            MissingScalarType => "The scalar dimension declares no data type.",
            NotBoolean => "The value is not a boolean.",
            NotInteger => "The value is not an integer.",
            NotNumber => "The value is not a number.",
            ValueLowRange => "The value is below the valid range.",
            ValueHighRange => "The value is above the valid range.",
            ValueOutOfRange => "The value is out of the valid range.",
            NotTimestamp => "The value cannot be interpreted as a timestamp.",
            Unsupported => "The declared data type is not supported.",
            NotString => "The value is not a string.",
            NoMatchRegexp => "The value does not match the required pattern.",
            EmptyKey => "The key is empty.",
            NotEnum => "The term is not an enumeration element.",
            NotStructureDefinition => "The term is not a structure definition.",
            NoRefDefaultNamespace => "References to the default namespace are not allowed.",
            UnknownDocument => "The document does not exist.",
            BadKeyValue => "The value is not a valid document key.",
            BadHandleValue => "The value is not a valid document handle.",
            BadCollectionName => "The value is not a valid collection name.",
            UnknownCollection => "The collection does not exist.",
            NotCorrectEnumType => "The term does not belong to the required enumeration type.",
            DuplicateSetEntry => "The set contains a duplicate element.",
            StoreFailure => "The dictionary store reported a failure.",
            Cancelled => "The validation was cancelled.",
        }
    }

    fn message_it(self) -> &'static str {
        use StatusCode::*;
        match self {
            InvalidDataKindOption => "Opzione di genere dati non valida.",
            NotArrayDataKind => "Il genere dei dati non è una lista.",
            RangeNotAnObject => "L'intervallo di validità non è un oggetto.",
            ExpectingDataDimension => "È attesa esattamente una dimensione dei dati.",
            Ok => "Inattivo.",
            NotAnObject => "Il valore non è un oggetto.",
            NotAnArray => "Il valore non è una lista.",
            EmptyObject => "L'oggetto è vuoto.",
            UnknownTerm => "Il riferimento non corrisponde ad alcun termine.",
            NotDescriptor => "Il termine non è un descrittore.",
            NotScalar => "Il valore non è uno scalare.",
            MissingScalarType => "La dimensione scalare non dichiara un tipo.",
            NotBoolean => "Il valore non è un booleano.",
            NotInteger => "Il valore non è un intero.",
            NotNumber => "Il valore non è un numero.",
            ValueLowRange => "Il valore è sotto l'intervallo di validità.",
            ValueHighRange => "Il valore è sopra l'intervallo di validità.",
            ValueOutOfRange => "Il valore è fuori dall'intervallo di validità.",
            NotTimestamp => "Il valore non è interpretabile come data.",
            Unsupported => "Il tipo di dati dichiarato non è supportato.",
            NotString => "Il valore non è una stringa.",
            NoMatchRegexp => "Il valore non corrisponde al modello richiesto.",
            EmptyKey => "La chiave è vuota.",
            NotEnum => "Il termine non è un elemento di enumerazione.",
            NotStructureDefinition => "Il termine non è una definizione di struttura.",
            NoRefDefaultNamespace => "I riferimenti allo spazio dei nomi predefinito non sono ammessi.",
            UnknownDocument => "Il documento non esiste.",
            BadKeyValue => "Il valore non è una chiave di documento valida.",
            BadHandleValue => "Il valore non è un riferimento a documento valido.",
            BadCollectionName => "Il valore non è un nome di collezione valido.",
            UnknownCollection => "La collezione non esiste.",
            NotCorrectEnumType => "Il termine non appartiene al tipo di enumerazione richiesto.",
            DuplicateSetEntry => "L'insieme contiene un elemento duplicato.",
            StoreFailure => "L'archivio del dizionario ha riportato un errore.",
            Cancelled => "La validazione è stata annullata.",
        }
    }
}

/// Status record written into a report slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

impl Status {
    pub fn new(code: StatusCode, language: &str) -> Self {
        Self {
            code: code.code(),
            message: code.message(language).to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok.code()
    }
}
