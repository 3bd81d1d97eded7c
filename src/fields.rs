//! Gateway field schema
//!
//! Static declarations of every parameter the gateway accepts in a payment
//! request (`Ds_Merchant_*`) and every field it returns in a notification
//! (`Ds_*`), with their length limits and defaults.

/// Which side of the exchange a parameter set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Merchant to gateway (payment request)
    Outbound,
    /// Gateway to merchant (notification)
    Inbound,
}

/// How a field value is finalized before signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, truncated to `max_len` characters when one is declared
    Text,
    /// Currency amount in major units, sent in minor units (x100, truncated)
    Amount,
    /// Order identifier: truncated to `max_len`, then at least
    /// [`ORDER_MIN_LEN`] characters with a numeric prefix of that length
    Order,
}

/// Shortest order id the gateway accepts; this many leading digits are required
pub const ORDER_MIN_LEN: usize = 4;

/// Declaration of one gateway field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub mandatory: bool,
    pub max_len: Option<usize>,
    pub default: Option<&'static str>,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            mandatory: false,
            max_len: None,
            default: None,
        }
    }

    const fn amount(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Amount,
            mandatory: true,
            max_len: None,
            default: None,
        }
    }

    const fn order(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Order,
            mandatory: true,
            max_len: Some(12),
            default: None,
        }
    }

    const fn required(mut self) -> Self {
        self.mandatory = true;
        self
    }

    const fn max(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    const fn or(mut self, default: &'static str) -> Self {
        self.mandatory = true;
        self.default = Some(default);
        self
    }
}

pub const MERCHANT_AMOUNT: &str = "Ds_Merchant_Amount";
pub const MERCHANT_CURRENCY: &str = "Ds_Merchant_Currency";
pub const MERCHANT_ORDER: &str = "Ds_Merchant_Order";
pub const MERCHANT_PRODUCT_DESCRIPTION: &str = "Ds_Merchant_ProductDescription";
pub const MERCHANT_TITULAR: &str = "Ds_Merchant_Titular";
pub const MERCHANT_CODE: &str = "Ds_Merchant_MerchantCode";
pub const MERCHANT_URL: &str = "Ds_Merchant_MerchantURL";
pub const MERCHANT_URL_OK: &str = "Ds_Merchant_UrlOK";
pub const MERCHANT_URL_KO: &str = "Ds_Merchant_UrlKO";
pub const MERCHANT_NAME: &str = "Ds_Merchant_MerchantName";
pub const MERCHANT_CONSUMER_LANGUAGE: &str = "Ds_Merchant_ConsumerLanguage";
pub const MERCHANT_TERMINAL: &str = "Ds_Merchant_Terminal";
pub const MERCHANT_SUM_TOTAL: &str = "Ds_Merchant_SumTotal";
pub const MERCHANT_TRANSACTION_TYPE: &str = "Ds_Merchant_TransactionType";
pub const MERCHANT_DATA: &str = "Ds_Merchant_MerchantData";
pub const MERCHANT_DATE_FRECUENCY: &str = "Ds_Merchant_DateFrecuency";
pub const MERCHANT_CHARGE_EXPIRY_DATE: &str = "Ds_Merchant_ChargeExpiryDate";
pub const MERCHANT_AUTHORISATION_CODE: &str = "Ds_Merchant_AuthorisationCode";
pub const MERCHANT_TRANSACTION_DATE: &str = "Ds_Merchant_TransactionDate";

/// Legacy SHA-1 form field carrying the signature
pub const MERCHANT_SIGNATURE: &str = "Ds_Merchant_MerchantSignature";

pub const DS_DATE: &str = "Ds_Date";
pub const DS_HOUR: &str = "Ds_Hour";
pub const DS_AMOUNT: &str = "Ds_Amount";
pub const DS_CURRENCY: &str = "Ds_Currency";
pub const DS_ORDER: &str = "Ds_Order";
pub const DS_MERCHANT_CODE: &str = "Ds_MerchantCode";
pub const DS_TERMINAL: &str = "Ds_Terminal";
pub const DS_RESPONSE: &str = "Ds_Response";
pub const DS_MERCHANT_DATA: &str = "Ds_MerchantData";
pub const DS_SECURE_PAYMENT: &str = "Ds_SecurePayment";
pub const DS_TRANSACTION_TYPE: &str = "Ds_TransactionType";
pub const DS_CARD_COUNTRY: &str = "Ds_Card_Country";
pub const DS_AUTHORISATION_CODE: &str = "Ds_AuthorisationCode";
pub const DS_CONSUMER_LANGUAGE: &str = "Ds_ConsumerLanguage";
pub const DS_CARD_TYPE: &str = "Ds_Card_Type";
pub const DS_ERROR_CODE: &str = "Ds_ErrorCode";

/// ISO-4217 numeric code for EUR
pub const DEFAULT_CURRENCY: &str = "978";
pub const DEFAULT_TERMINAL: &str = "1";
pub const DEFAULT_TRANSACTION_TYPE: &str = "0";

/// Payment request fields, in the gateway's documentation order
pub const OUTBOUND_FIELDS: &[FieldSpec] = &[
    FieldSpec::amount(MERCHANT_AMOUNT),
    FieldSpec::text(MERCHANT_CURRENCY).or(DEFAULT_CURRENCY),
    FieldSpec::order(MERCHANT_ORDER),
    FieldSpec::text(MERCHANT_PRODUCT_DESCRIPTION).max(125),
    FieldSpec::text(MERCHANT_TITULAR).max(60),
    FieldSpec::text(MERCHANT_CODE).required().max(9),
    FieldSpec::text(MERCHANT_URL).required().max(250),
    FieldSpec::text(MERCHANT_URL_OK).max(250),
    FieldSpec::text(MERCHANT_URL_KO).max(250),
    FieldSpec::text(MERCHANT_NAME).max(25),
    FieldSpec::text(MERCHANT_CONSUMER_LANGUAGE),
    FieldSpec::text(MERCHANT_TERMINAL).or(DEFAULT_TERMINAL),
    FieldSpec::amount(MERCHANT_SUM_TOTAL),
    FieldSpec::text(MERCHANT_TRANSACTION_TYPE).or(DEFAULT_TRANSACTION_TYPE),
    FieldSpec::text(MERCHANT_DATA).max(1024),
    FieldSpec::text(MERCHANT_DATE_FRECUENCY),
    FieldSpec::text(MERCHANT_CHARGE_EXPIRY_DATE).max(10),
    FieldSpec::text(MERCHANT_AUTHORISATION_CODE),
    FieldSpec::text(MERCHANT_TRANSACTION_DATE),
];

/// Notification fields returned by the gateway
pub const INBOUND_FIELDS: &[&str] = &[
    DS_DATE,
    DS_HOUR,
    DS_AMOUNT,
    DS_CURRENCY,
    DS_ORDER,
    DS_MERCHANT_CODE,
    DS_TERMINAL,
    DS_RESPONSE,
    DS_MERCHANT_DATA,
    DS_SECURE_PAYMENT,
    DS_TRANSACTION_TYPE,
    DS_CARD_COUNTRY,
    DS_AUTHORISATION_CODE,
    DS_CONSUMER_LANGUAGE,
    DS_CARD_TYPE,
    DS_ERROR_CODE,
];

/// Returns true if `name` is a declared field for `direction` (exact case)
pub fn is_allowed(direction: Direction, name: &str) -> bool {
    match direction {
        Direction::Outbound => outbound_spec(name).is_some(),
        Direction::Inbound => INBOUND_FIELDS.contains(&name),
    }
}

/// Look up the declaration of an outbound field
pub fn outbound_spec(name: &str) -> Option<&'static FieldSpec> {
    OUTBOUND_FIELDS.iter().find(|spec| spec.name == name)
}

/// Name of the field carrying the order id for `direction`
pub fn order_field(direction: Direction) -> &'static str {
    match direction {
        Direction::Outbound => MERCHANT_ORDER,
        Direction::Inbound => DS_ORDER,
    }
}

/// Map an all-uppercase field name back to its canonical casing
///
/// Only the exact uppercase rendering is recognized (`DS_ORDER` for
/// `Ds_Order`); other casings return `None`.
pub fn canonical_name(direction: Direction, name: &str) -> Option<&'static str> {
    let matches_upper = |candidate: &&'static str| {
        candidate.len() == name.len() && candidate.to_ascii_uppercase() == name
    };
    match direction {
        Direction::Outbound => OUTBOUND_FIELDS
            .iter()
            .map(|spec| spec.name)
            .find(|candidate| matches_upper(candidate)),
        Direction::Inbound => INBOUND_FIELDS.iter().copied().find(|c| matches_upper(c)),
    }
}

/// Consumer language codes accepted by the gateway
pub const LANGUAGES: &[(&str, &str)] = &[
    ("001", "es_ES"),
    ("002", "en_US"),
    ("003", "ca_ES"),
    ("004", "fr_FR"),
    ("005", "de_DE"),
    ("006", "nl_NL"),
    ("007", "it_IT"),
    ("008", "sv_SE"),
    ("009", "pt_PT"),
    // Valencian
    ("010", "ca_ES"),
    ("011", "pl_PL"),
    ("012", "gl_ES"),
    ("013", "eu_ES"),
    ("208", "da_DK"),
];

/// Locale tag for a 3-digit gateway language code
///
/// Notifications sometimes drop the leading zeros (`"1"` for `"001"`), so
/// shorter numeric codes are zero-padded before lookup.
pub fn locale_for_language(code: &str) -> Option<&'static str> {
    let code = code.trim();
    if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0>3}", code);
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == padded)
        .map(|(_, locale)| *locale)
}

/// First gateway language code for a locale tag
pub fn language_for_locale(locale: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(_, l)| l.eq_ignore_ascii_case(locale))
        .map(|(code, _)| *code)
}
